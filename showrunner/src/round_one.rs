//! Round 1: every judge scores a researched submission.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use panel::{Judge, JudgeScore, PromptAssembler, Round, ScoringEngine};
use studio_agent::{GenerationPurpose, GenerationRequest};
use tracing::{error, info, warn};

use crate::generation::GenerationClient;
use crate::lifecycle::{self, SubmissionStatus, Transition};
use crate::store::{ShowStore, StoreError};
use crate::types::{BatchOutcome, BatchReport, Result, ShowError, Submission};

/// What happened for one judge.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutcome {
    /// A new record was written
    Scored { weighted_total: f64, fallback: bool },
    /// A record already existed; nothing was written
    AlreadyScored,
}

/// Result of scoring one submission.
#[derive(Debug, Clone)]
pub struct RoundOneReport {
    pub submission_id: String,
    /// One entry per judge, in seat order
    pub outcomes: Vec<(Judge, JudgeOutcome)>,
    /// Status after the run
    pub status: SubmissionStatus,
}

impl RoundOneReport {
    pub fn newly_scored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, JudgeOutcome::Scored { .. }))
            .count()
    }
}

/// Runs Round 1 judging.
pub struct RoundOneScorer {
    store: Arc<dyn ShowStore>,
    client: GenerationClient,
}

impl RoundOneScorer {
    pub fn new(store: Arc<dyn ShowStore>, client: GenerationClient) -> Self {
        Self { store, client }
    }

    /// Score one submission with all four judges, sequentially.
    ///
    /// Judges that already hold a Round 1 record are skipped, so re-running
    /// is safe. The submission advances to `scored` only once all four
    /// records exist.
    pub async fn score_submission(&self, submission_id: &str) -> Result<RoundOneReport> {
        let submission = self.store.submission(submission_id).await?;
        if !matches!(
            submission.status,
            SubmissionStatus::Researched | SubmissionStatus::Scored
        ) {
            return Err(ShowError::WrongStatus {
                submission_id: submission_id.to_string(),
                status: submission.status,
                expected: SubmissionStatus::Researched,
            });
        }

        let existing: BTreeSet<Judge> = self
            .store
            .scores(submission_id, Round::One)
            .await?
            .iter()
            .map(|s| s.judge)
            .collect();

        info!(
            submission_id = %submission_id,
            project = %submission.name(),
            already_scored = existing.len(),
            "Starting Round 1"
        );

        let delay = Duration::from_millis(self.client.config().inter_call_delay_ms);
        let mut outcomes = Vec::with_capacity(Judge::ALL.len());
        let mut called = false;

        for judge in Judge::ALL {
            if existing.contains(&judge) {
                info!(submission_id = %submission_id, judge = %judge, "Already scored, skipping");
                outcomes.push((judge, JudgeOutcome::AlreadyScored));
                continue;
            }

            if called && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            called = true;

            let score = self.judge_once(&submission, judge).await;
            let weighted_total = score.weighted_total;
            let fallback = score.is_fallback();

            match self.store.insert_score(score).await {
                Ok(()) => {
                    info!(
                        submission_id = %submission_id,
                        judge = %judge,
                        weighted_total,
                        fallback,
                        "Round 1 score recorded"
                    );
                    outcomes.push((judge, JudgeOutcome::Scored { weighted_total, fallback }));
                }
                Err(StoreError::Duplicate(key)) => {
                    info!(key = %key, "Score written concurrently, skipping");
                    outcomes.push((judge, JudgeOutcome::AlreadyScored));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let status = self.advance_if_complete(&submission).await?;
        Ok(RoundOneReport {
            submission_id: submission_id.to_string(),
            outcomes,
            status,
        })
    }

    /// Score every `researched` submission; failures are logged and skipped.
    pub async fn score_batch(&self) -> Result<BatchReport<RoundOneReport>> {
        let pending = self
            .store
            .submissions_with_status(SubmissionStatus::Researched)
            .await?;
        info!(count = pending.len(), "Round 1 batch");

        let mut report = Vec::with_capacity(pending.len());
        for submission in pending {
            let id = submission.submission_id;
            let outcome = match self.score_submission(&id).await {
                Ok(result) => BatchOutcome::Processed(result),
                Err(e) => {
                    error!(submission_id = %id, error = %e, "Round 1 failed, continuing");
                    BatchOutcome::Failed(e)
                }
            };
            report.push((id, outcome));
        }
        Ok(report)
    }

    /// Ask one judge; a failed call yields the neutral fallback record.
    async fn judge_once(&self, submission: &Submission, judge: Judge) -> JudgeScore {
        let prompt = PromptAssembler::build_evaluation_prompt(
            judge,
            &submission.project,
            submission.research.as_deref(),
        );
        let config = self.client.config();
        let request = GenerationRequest::user(prompt.user)
            .with_system(prompt.system)
            .for_purpose(GenerationPurpose::Scoring)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);

        match self.client.generate(request).await {
            Ok(generation) => {
                ScoringEngine::score_reply(&submission.submission_id, judge, &generation.content)
            }
            Err(e) => {
                warn!(
                    submission_id = %submission.submission_id,
                    judge = %judge,
                    error = %e,
                    "Judge call failed, recording neutral fallback"
                );
                ScoringEngine::neutral_fallback(&submission.submission_id, judge, e.to_string())
            }
        }
    }

    async fn advance_if_complete(&self, submission: &Submission) -> Result<SubmissionStatus> {
        if submission.status != SubmissionStatus::Researched {
            return Ok(submission.status);
        }

        let scored: BTreeSet<Judge> = self
            .store
            .scores(&submission.submission_id, Round::One)
            .await?
            .iter()
            .map(|s| s.judge)
            .collect();
        let transition = Transition::CompleteRoundOne { scored };

        if lifecycle::check(submission.status, &transition).is_err() {
            warn!(
                submission_id = %submission.submission_id,
                "Round 1 incomplete, status unchanged"
            );
            return Ok(submission.status);
        }

        let next = lifecycle::advance(submission.status, &transition);
        self.store.set_status(&submission.submission_id, next).await?;
        info!(submission_id = %submission.submission_id, status = %next, "Submission scored");
        Ok(next)
    }
}
