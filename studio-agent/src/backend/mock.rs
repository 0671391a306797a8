//! Mock generation backend for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::traits::*;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this content
    Text(String),
    /// Fail with `RequestFailed(reason)`
    Fail(String),
}

/// Mock backend for testing.
///
/// Replies are resolved in order: a matching failure marker, then the
/// scripted queue, then the per-purpose reply, then the default reply.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    response_content: String,
    purpose_responses: HashMap<GenerationPurpose, String>,
    script: Mutex<VecDeque<MockReply>>,
    fail_markers: Vec<String>,
    latency: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            response_content: "Mock response".to_string(),
            purpose_responses: HashMap::new(),
            script: Mutex::new(VecDeque::new()),
            fail_markers: Vec::new(),
            latency: None,
            requests: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the default response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// Set the response for every request of one purpose.
    pub fn with_purpose_response(
        mut self,
        purpose: GenerationPurpose,
        content: impl Into<String>,
    ) -> Self {
        self.purpose_responses.insert(purpose, content.into());
        self
    }

    /// Queue scripted outcomes, consumed one per call.
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        lock(&self.script).extend(replies);
        self
    }

    /// Fail every request whose prompt text contains `marker`.
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Sleep before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Get the number of times generate was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received for one purpose.
    pub fn calls_for(&self, purpose: GenerationPurpose) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.purpose == purpose)
            .count()
    }

    fn next_reply(&self, request: &GenerationRequest) -> MockReply {
        let prompt = request.prompt_text();
        if let Some(marker) = self.fail_markers.iter().find(|m| prompt.contains(m.as_str())) {
            return MockReply::Fail(format!("scripted failure on '{}'", marker));
        }
        if let Some(reply) = lock(&self.script).pop_front() {
            return reply;
        }
        let content = self
            .purpose_responses
            .get(&request.purpose)
            .unwrap_or(&self.response_content);
        MockReply::Text(content.clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl GenerationBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(GenerationError::Unavailable("Mock backend disabled".to_string()));
        }

        let content = match self.next_reply(&request) {
            MockReply::Text(content) => content,
            MockReply::Fail(reason) => return Err(GenerationError::RequestFailed(reason)),
        };

        // Estimate token counts
        let prompt_tokens = request.prompt_text().len() as u32 / 4;
        let completion_tokens = content.len() as u32 / 4;

        Ok(Generation {
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
            },
        })
    }
}
