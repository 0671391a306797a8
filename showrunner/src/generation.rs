//! Generation calls with timeout and bounded retry.

use std::sync::Arc;
use std::time::Duration;

use studio_agent::{Generation, GenerationBackend, GenerationError, GenerationRequest};
use tracing::{debug, warn};

use crate::config::ScoringConfig;

/// Wraps a backend with the show's call policy.
///
/// Every call is bounded by `call_timeout_ms`. Retryable failures are retried
/// up to `retry_count` times with a linearly growing delay; a rate limit hint
/// from the backend takes precedence over the configured delay, capped at
/// `max_retry_after_ms`.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    config: ScoringConfig,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: ScoringConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend_id(&self) -> &str {
        self.backend.id()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Send a request, retrying per the configured policy.
    pub async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let mut attempt = 0;
        loop {
            let err = match self.attempt(request.clone()).await {
                Ok(generation) => return Ok(generation),
                Err(err) => err,
            };

            if attempt >= self.config.retry_count || !err.is_retryable() {
                warn!(
                    request_id = %request.request_id,
                    purpose = %request.purpose,
                    attempts = attempt + 1,
                    error = %err,
                    "Generation failed"
                );
                return Err(err);
            }

            attempt += 1;
            let delay_ms = match &err {
                GenerationError::RateLimited {
                    retry_after_ms: Some(ms),
                } => (*ms).min(self.config.max_retry_after_ms),
                _ => self.config.retry_delay_ms.saturating_mul(attempt as u64),
            };
            debug!(
                request_id = %request.request_id,
                attempt,
                delay_ms,
                error = %err,
                "Retrying generation"
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    async fn attempt(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let timeout_ms = self.config.call_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.backend.generate(request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout_ms)),
        }
    }
}
