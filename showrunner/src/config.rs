//! Configuration for the show pipeline.

use std::path::Path;

use panel::VotePolicy;
use serde::{Deserialize, Serialize};

use crate::types::{Result, ShowError};

/// Configuration for a show run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    /// Round 1 scoring configuration
    pub scoring: ScoringConfig,
    /// Round 2 synthesis configuration
    pub synthesis: SynthesisConfig,
    /// Episode configuration
    pub episode: EpisodeConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl ShowConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ShowError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml).map_err(|e| ShowError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Judge call policy for Round 1 and verdict generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Delay between consecutive judge calls (ms)
    pub inter_call_delay_ms: u64,
    /// Timeout for a single generation call (ms)
    pub call_timeout_ms: u64,
    /// Retries after a failed generation call
    pub retry_count: usize,
    /// Base retry delay (ms), multiplied by the attempt number
    pub retry_delay_ms: u64,
    /// Upper bound on a server-requested rate limit wait (ms)
    pub max_retry_after_ms: u64,
    /// Maximum tokens per judge reply
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: 1_000,
            call_timeout_ms: 60_000,
            retry_count: 2,
            retry_delay_ms: 2_000,
            max_retry_after_ms: 30_000,
            max_tokens: 1_000,
            temperature: 0.7,
        }
    }
}

/// Community synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// How reaction events are counted
    pub vote_policy: VotePolicy,
    /// Maximum tokens per verdict
    pub verdict_max_tokens: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            vote_policy: VotePolicy::CountAll,
            verdict_max_tokens: 200,
        }
    }
}

/// Episode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Host character id
    pub host_id: String,
    /// Character id of the pitching representative
    pub pitcher_id: String,
    /// Producer character id
    pub producer_id: String,
    /// Required prefix for `user-avatar` producer actions
    pub avatar_url_prefix: String,
    /// Maximum tokens for an episode script
    pub max_tokens: u32,
    /// Sampling temperature for episode scripts
    pub temperature: f32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            host_id: "eliza".to_string(),
            pitcher_id: "pitchbot".to_string(),
            producer_id: "jin".to_string(),
            avatar_url_prefix: "https://cdn.discordapp.com/avatars/".to_string(),
            max_tokens: 8_000,
            temperature: 0.8,
        }
    }
}

/// General configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Show name used in prompts
    pub show_name: String,
    /// Model identifier passed to the generation backend
    pub model: String,
    /// Log level hint for the binary that installs the subscriber
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            show_name: "Clank Tank".to_string(),
            model: "anthropic/claude-3-opus".to_string(),
            log_level: "info".to_string(),
        }
    }
}
