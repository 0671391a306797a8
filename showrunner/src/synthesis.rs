//! Round 2: community bonus synthesis and final verdicts.
//!
//! Bonuses are normalized across an explicit cohort: the submission with the
//! most reactions gets the full bonus and everyone else a proportional share.
//! Each judge then gives a verdict on its own Round 1 record plus the bonus.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use panel::{
    final_score, Cohort, Judge, JudgeScore, PromptAssembler, ReactionTally, Round, ScoringEngine,
};
use studio_agent::{GenerationPurpose, GenerationRequest};
use tracing::{error, info, warn};

use crate::config::SynthesisConfig;
use crate::generation::GenerationClient;
use crate::lifecycle::{self, SubmissionStatus, Transition};
use crate::store::{ShowStore, StoreError};
use crate::types::{BatchOutcome, BatchReport, Result, ShowError, Submission};

/// What happened for one judge's verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictOutcome {
    /// A Round 2 record was written
    Decided { final_score: f64, fallback: bool },
    /// A Round 2 record already existed
    AlreadyDecided,
}

/// Result of synthesizing one submission.
#[derive(Debug, Clone)]
pub struct SynthesisReport {
    pub submission_id: String,
    pub reactions: ReactionTally,
    pub community_bonus: f64,
    /// One entry per judge holding a Round 1 record, in seat order
    pub verdicts: Vec<(Judge, VerdictOutcome)>,
    pub status: SubmissionStatus,
}

/// Runs community synthesis.
pub struct CommunitySynthesizer {
    store: Arc<dyn ShowStore>,
    client: GenerationClient,
    config: SynthesisConfig,
}

impl CommunitySynthesizer {
    pub fn new(store: Arc<dyn ShowStore>, client: GenerationClient, config: SynthesisConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Synthesize every submission currently in `community_voting`, treating
    /// them as one cohort.
    pub async fn synthesize_voting(&self) -> Result<BatchReport<SynthesisReport>> {
        let cohort: Vec<String> = self
            .store
            .submissions_with_status(SubmissionStatus::CommunityVoting)
            .await?
            .into_iter()
            .map(|s| s.submission_id)
            .collect();
        self.synthesize(&cohort).await
    }

    /// Synthesize a cohort of submissions.
    ///
    /// Members not in `community_voting` are reported as skipped and take no
    /// part in bonus normalization. Each remaining member is processed
    /// independently; a failure is logged and the batch continues.
    pub async fn synthesize(&self, cohort_ids: &[String]) -> Result<BatchReport<SynthesisReport>> {
        let mut report: BatchReport<SynthesisReport> = Vec::with_capacity(cohort_ids.len());
        let mut eligible: Vec<(Submission, ReactionTally)> = Vec::new();

        for id in cohort_ids {
            match self.load_member(id).await {
                Ok(Some(member)) => eligible.push(member),
                Ok(None) => {}
                Err(e) => {
                    error!(submission_id = %id, error = %e, "Cannot load cohort member, continuing");
                    report.push((id.clone(), BatchOutcome::Failed(e)));
                }
            }
        }

        let cohort = Cohort::new(
            eligible
                .iter()
                .map(|(s, tally)| (s.submission_id.clone(), tally.total())),
        );
        info!(
            cohort_size = cohort.len(),
            max_reactions = cohort.max_reactions(),
            "Community synthesis"
        );

        for id in cohort_ids {
            if report.iter().any(|(done, _)| done == id) {
                continue;
            }
            let Some((submission, tally)) = eligible.iter().find(|(s, _)| &s.submission_id == id)
            else {
                let reason = "not in community_voting".to_string();
                warn!(submission_id = %id, "Skipping synthesis: {}", reason);
                report.push((id.clone(), BatchOutcome::Skipped { reason }));
                continue;
            };

            let bonus = cohort.bonus_for(id).unwrap_or(0.0);
            let outcome = match self.synthesize_one(submission, tally, bonus).await {
                Ok(result) => BatchOutcome::Processed(result),
                Err(e) => {
                    error!(submission_id = %id, error = %e, "Synthesis failed, continuing");
                    BatchOutcome::Failed(e)
                }
            };
            report.push((id.clone(), outcome));
        }

        Ok(report)
    }

    async fn load_member(&self, id: &str) -> Result<Option<(Submission, ReactionTally)>> {
        let submission = self.store.submission(id).await?;
        if submission.status != SubmissionStatus::CommunityVoting {
            return Ok(None);
        }
        let tally = self.store.reaction_tally(id, self.config.vote_policy).await?;
        Ok(Some((submission, tally)))
    }

    async fn synthesize_one(
        &self,
        submission: &Submission,
        tally: &ReactionTally,
        bonus: f64,
    ) -> Result<SynthesisReport> {
        let id = submission.submission_id.as_str();
        let round_one = self.store.scores(id, Round::One).await?;
        if round_one.is_empty() {
            return Err(ShowError::NotReady {
                submission_id: id.to_string(),
                reason: "no Round 1 records".to_string(),
            });
        }

        let decided: BTreeSet<Judge> = self
            .store
            .scores(id, Round::Two)
            .await?
            .iter()
            .map(|s| s.judge)
            .collect();

        info!(
            submission_id = %id,
            reactions = tally.total(),
            community_bonus = bonus,
            "Synthesizing verdicts"
        );

        let delay = Duration::from_millis(self.client.config().inter_call_delay_ms);
        let mut verdicts = Vec::with_capacity(round_one.len());
        let mut called = false;

        for record in &round_one {
            if decided.contains(&record.judge) {
                verdicts.push((record.judge, VerdictOutcome::AlreadyDecided));
                continue;
            }
            if called && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            called = true;

            let verdict = self.verdict_for(submission, record, tally, bonus).await;
            let final_total = verdict.weighted_total;
            let fallback = verdict.is_fallback();

            match self.store.insert_score(verdict).await {
                Ok(()) => {
                    info!(
                        submission_id = %id,
                        judge = %record.judge,
                        final_score = final_total,
                        fallback,
                        "Round 2 verdict recorded"
                    );
                    verdicts.push((
                        record.judge,
                        VerdictOutcome::Decided {
                            final_score: final_total,
                            fallback,
                        },
                    ));
                }
                Err(StoreError::Duplicate(_)) => {
                    verdicts.push((record.judge, VerdictOutcome::AlreadyDecided));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let status = self.complete(submission, &round_one).await?;
        Ok(SynthesisReport {
            submission_id: id.to_string(),
            reactions: tally.clone(),
            community_bonus: bonus,
            verdicts,
            status,
        })
    }

    /// One judge's verdict; falls back to a templated sentence on failure.
    async fn verdict_for(
        &self,
        submission: &Submission,
        round_one: &JudgeScore,
        tally: &ReactionTally,
        bonus: f64,
    ) -> JudgeScore {
        let total = final_score(round_one.weighted_total, bonus);
        let prompt =
            PromptAssembler::build_verdict_prompt(round_one, &submission.project, tally, total);
        let request = GenerationRequest::user(prompt.user)
            .with_system(prompt.system)
            .for_purpose(GenerationPurpose::Verdict)
            .with_max_tokens(self.config.verdict_max_tokens)
            .with_temperature(self.client.config().temperature);

        let reply = match self.client.generate(request).await {
            Ok(generation) => Some(generation.content.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(
                    submission_id = %submission.submission_id,
                    judge = %round_one.judge,
                    error = %e,
                    "Verdict call failed, using templated verdict"
                );
                None
            }
        };

        match reply {
            Some(text) => ScoringEngine::verdict(round_one, bonus, tally.clone(), text, false),
            None => ScoringEngine::verdict(
                round_one,
                bonus,
                tally.clone(),
                PromptAssembler::fallback_verdict(round_one.judge, total),
                true,
            ),
        }
    }

    async fn complete(
        &self,
        submission: &Submission,
        round_one: &[JudgeScore],
    ) -> Result<SubmissionStatus> {
        let id = submission.submission_id.as_str();
        let round_two: BTreeSet<Judge> = self
            .store
            .scores(id, Round::Two)
            .await?
            .iter()
            .map(|s| s.judge)
            .collect();
        let transition = Transition::CompleteRoundTwo {
            round_one: round_one.iter().map(|s| s.judge).collect(),
            round_two,
        };

        if lifecycle::check(submission.status, &transition).is_err() {
            warn!(submission_id = %id, "Round 2 incomplete, status unchanged");
            return Ok(submission.status);
        }

        let next = lifecycle::advance(submission.status, &transition);
        self.store.set_status(id, next).await?;
        info!(submission_id = %id, status = %next, "Submission completed");
        Ok(next)
    }
}
