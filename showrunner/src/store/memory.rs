//! In-memory store backed by concurrent maps.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use panel::{JudgeScore, ReactionEvent, ReactionTally, Round, ScoreKey, VotePolicy};
use tracing::debug;

use super::{ShowStore, StoreError};
use crate::lifecycle::SubmissionStatus;
use crate::types::Submission;

/// Store for tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    /// Submissions by id
    submissions: DashMap<String, Submission>,
    /// Score records by key
    scores: DashMap<ScoreKey, JudgeScore>,
    /// Raw reaction events by submission id
    reactions: DashMap<String, Vec<ReactionEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a submission; fails if the id is taken.
    pub fn insert_submission(&self, submission: Submission) -> Result<(), StoreError> {
        match self.submissions.entry(submission.submission_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::SubmissionExists(submission.submission_id)),
            Entry::Vacant(slot) => {
                slot.insert(submission);
                Ok(())
            }
        }
    }

    /// Record one community reaction.
    pub fn record_reaction(&self, event: ReactionEvent) -> Result<(), StoreError> {
        if !self.submissions.contains_key(&event.submission_id) {
            return Err(StoreError::NotFound(event.submission_id));
        }
        debug!(
            submission_id = %event.submission_id,
            voter_id = %event.voter_id,
            category = %event.category,
            "Reaction recorded"
        );
        self.reactions
            .entry(event.submission_id.clone())
            .or_default()
            .push(event);
        Ok(())
    }

    /// Number of score records held.
    pub fn score_count(&self) -> usize {
        self.scores.len()
    }
}

#[async_trait]
impl ShowStore for MemoryStore {
    async fn submission(&self, submission_id: &str) -> Result<Submission, StoreError> {
        self.submissions
            .get(submission_id)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::NotFound(submission_id.to_string()))
    }

    async fn submissions_with_status(
        &self,
        status: SubmissionStatus,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut matching: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| s.status == status)
            .map(|s| s.clone())
            .collect();
        matching.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));
        Ok(matching)
    }

    async fn set_status(
        &self,
        submission_id: &str,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let mut submission = self
            .submissions
            .get_mut(submission_id)
            .ok_or_else(|| StoreError::NotFound(submission_id.to_string()))?;
        submission.status = status;
        submission.updated_at = Utc::now();
        Ok(())
    }

    async fn attach_research(&self, submission_id: &str, research: &str) -> Result<(), StoreError> {
        let mut submission = self
            .submissions
            .get_mut(submission_id)
            .ok_or_else(|| StoreError::NotFound(submission_id.to_string()))?;
        submission.research = Some(research.to_string());
        submission.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_score(&self, score: JudgeScore) -> Result<(), StoreError> {
        if !self.submissions.contains_key(&score.submission_id) {
            return Err(StoreError::NotFound(score.submission_id));
        }
        match self.scores.entry(score.key()) {
            Entry::Occupied(existing) => Err(StoreError::Duplicate(existing.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(score);
                Ok(())
            }
        }
    }

    async fn scores(&self, submission_id: &str, round: Round) -> Result<Vec<JudgeScore>, StoreError> {
        let mut records: Vec<JudgeScore> = self
            .scores
            .iter()
            .filter(|r| r.submission_id == submission_id && r.round == round)
            .map(|r| r.clone())
            .collect();
        records.sort_by_key(|r| r.judge.seat());
        Ok(records)
    }

    async fn reaction_tally(
        &self,
        submission_id: &str,
        policy: VotePolicy,
    ) -> Result<ReactionTally, StoreError> {
        if !self.submissions.contains_key(submission_id) {
            return Err(StoreError::NotFound(submission_id.to_string()));
        }
        Ok(self
            .reactions
            .get(submission_id)
            .map(|events| ReactionTally::from_events(events.iter(), policy))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel::{Judge, ProjectFields, ReactionCategory, ScoringEngine};

    fn store_with(id: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_submission(Submission::new(id, ProjectFields::new("Demo", "A demo")))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_score_is_insert_or_fail() {
        let store = store_with("sub-1");
        let score = ScoringEngine::neutral_fallback("sub-1", Judge::Marc, "boom");

        store.insert_score(score.clone()).await.unwrap();
        let err = store.insert_score(score.clone()).await.unwrap_err();
        assert_eq!(err, StoreError::Duplicate(score.key()));
        assert_eq!(store.score_count(), 1);
    }

    #[tokio::test]
    async fn test_scores_filtered_by_round_in_seat_order() {
        let store = store_with("sub-1");
        for judge in [Judge::Peepo, Judge::Marc] {
            store
                .insert_score(ScoringEngine::neutral_fallback("sub-1", judge, "x"))
                .await
                .unwrap();
        }
        let round_one = store.scores("sub-1", Round::One).await.unwrap();
        assert_eq!(
            round_one.iter().map(|s| s.judge).collect::<Vec<_>>(),
            vec![Judge::Marc, Judge::Peepo]
        );
        assert!(store.scores("sub-1", Round::Two).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_and_research_updates() {
        let store = store_with("sub-1");
        store.attach_research("sub-1", "40 commits").await.unwrap();
        store.set_status("sub-1", SubmissionStatus::Researched).await.unwrap();

        let submission = store.submission("sub-1").await.unwrap();
        assert_eq!(submission.research.as_deref(), Some("40 commits"));
        assert_eq!(
            store
                .submissions_with_status(SubmissionStatus::Researched)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            store.set_status("missing", SubmissionStatus::Scored).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reaction_tally_applies_policy() {
        let store = store_with("sub-1");
        for _ in 0..3 {
            store
                .record_reaction(ReactionEvent::new("sub-1", "voter-a", ReactionCategory::Hype))
                .unwrap();
        }
        store
            .record_reaction(ReactionEvent::new("sub-1", "voter-b", ReactionCategory::Market))
            .unwrap();

        let all = store.reaction_tally("sub-1", VotePolicy::CountAll).await.unwrap();
        assert_eq!(all.total(), 4);
        let deduped = store
            .reaction_tally("sub-1", VotePolicy::DedupeVoterCategory)
            .await
            .unwrap();
        assert_eq!(deduped.total(), 2);
        assert!(store
            .record_reaction(ReactionEvent::new("nope", "voter-a", ReactionCategory::Hype))
            .is_err());
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let store = store_with("sub-1");
        let again = store.insert_submission(Submission::new("sub-1", ProjectFields::default()));
        assert!(matches!(again, Err(StoreError::SubmissionExists(_))));
    }
}
