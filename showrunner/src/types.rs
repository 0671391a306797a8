//! Core types for the show pipeline.

use chrono::{DateTime, Utc};
use panel::ProjectFields;
use serde::{Deserialize, Serialize};
use studio_agent::GenerationError;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::lifecycle::SubmissionStatus;
use crate::store::StoreError;

/// A hackathon submission as the pipeline sees it.
///
/// Owned by the store. The pipeline reads fields and only ever writes
/// `status` and `research` back through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Submission {
    /// Opaque submission id
    pub submission_id: String,
    /// Current lifecycle status
    pub status: SubmissionStatus,
    /// Project fields shown to judges
    pub project: ProjectFields,
    /// Research findings attached before scoring
    #[serde(default)]
    pub research: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Create a freshly submitted entry.
    pub fn new(submission_id: impl Into<String>, project: ProjectFields) -> Self {
        let now = Utc::now();
        Self {
            submission_id: submission_id.into(),
            status: SubmissionStatus::Submitted,
            project,
            research: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name for logs and prompts.
    pub fn name(&self) -> &str {
        &self.project.project_name
    }
}

/// Error types for the show pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    /// Store error
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Generation error
    #[error("Generation error: {0}")]
    GenerationError(#[from] GenerationError),

    /// Submission is not in a status the operation accepts
    #[error("Submission {submission_id} is {status}, expected {expected}")]
    WrongStatus {
        submission_id: String,
        status: SubmissionStatus,
        expected: SubmissionStatus,
    },

    /// Nothing to work from (e.g. no Round 1 records)
    #[error("Submission {submission_id} not ready: {reason}")]
    NotReady {
        submission_id: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ShowError>;

/// Outcome of a per-submission batch step.
#[derive(Debug)]
pub enum BatchOutcome<T> {
    /// The step ran
    Processed(T),
    /// The submission was not eligible
    Skipped { reason: String },
    /// The step failed; the batch continued
    Failed(ShowError),
}

impl<T> BatchOutcome<T> {
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }

    pub fn processed(&self) -> Option<&T> {
        match self {
            Self::Processed(value) => Some(value),
            _ => None,
        }
    }
}

/// Per-submission results of a batch run, in submission order.
pub type BatchReport<T> = Vec<(String, BatchOutcome<T>)>;
