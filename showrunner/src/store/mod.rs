//! Persistence seam for submissions, score records and reactions.
//!
//! The pipeline never takes locks of its own: uniqueness of score records
//! comes from the `(submission, judge, round)` key, and a
//! [`StoreError::Duplicate`] on insert means "already scored".

pub mod memory;

use async_trait::async_trait;
use panel::{JudgeScore, ReactionTally, Round, ScoreKey, VotePolicy};

use crate::lifecycle::SubmissionStatus;
use crate::types::Submission;

pub use memory::MemoryStore;

/// Error types for store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Submission does not exist
    #[error("Submission not found: {0}")]
    NotFound(String),

    /// Record with this key already exists
    #[error("Duplicate score record: {0}")]
    Duplicate(ScoreKey),

    /// Submission id already taken
    #[error("Submission already exists: {0}")]
    SubmissionExists(String),

    /// Underlying storage failed
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Store operations the pipeline relies on.
#[async_trait]
pub trait ShowStore: Send + Sync {
    /// Read one submission.
    async fn submission(&self, submission_id: &str) -> Result<Submission, StoreError>;

    /// All submissions in a status, ordered by id.
    async fn submissions_with_status(
        &self,
        status: SubmissionStatus,
    ) -> Result<Vec<Submission>, StoreError>;

    /// Overwrite a submission's status.
    async fn set_status(
        &self,
        submission_id: &str,
        status: SubmissionStatus,
    ) -> Result<(), StoreError>;

    /// Attach research findings to a submission.
    async fn attach_research(&self, submission_id: &str, research: &str) -> Result<(), StoreError>;

    /// Insert a score record; fails with `Duplicate` if the key exists.
    async fn insert_score(&self, score: JudgeScore) -> Result<(), StoreError>;

    /// Score records for one submission and round, in judge seat order.
    async fn scores(&self, submission_id: &str, round: Round) -> Result<Vec<JudgeScore>, StoreError>;

    /// Reaction tally for one submission under a counting policy.
    async fn reaction_tally(
        &self,
        submission_id: &str,
        policy: VotePolicy,
    ) -> Result<ReactionTally, StoreError>;
}
