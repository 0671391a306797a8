//! The show facade: one entry point over every pipeline stage.

use std::collections::BTreeSet;
use std::sync::Arc;

use panel::{Judge, Round};
use studio_agent::GenerationBackend;
use tracing::info;

use crate::config::ShowConfig;
use crate::episode::{EpisodeGate, EpisodeReview};
use crate::generation::GenerationClient;
use crate::leaderboard::{build_leaderboard, LeaderboardEntry};
use crate::lifecycle::{self, LifecycleViolation, SubmissionStatus, Transition};
use crate::producer::EpisodeProducer;
use crate::round_one::{RoundOneReport, RoundOneScorer};
use crate::store::ShowStore;
use crate::synthesis::{CommunitySynthesizer, SynthesisReport};
use crate::types::{BatchReport, Result, ShowError};

/// Runs a show over a store and a generation backend.
pub struct Showrunner {
    store: Arc<dyn ShowStore>,
    config: ShowConfig,
    round_one: RoundOneScorer,
    synthesizer: CommunitySynthesizer,
    producer: EpisodeProducer,
    gate: EpisodeGate,
}

impl Showrunner {
    pub fn new(
        store: Arc<dyn ShowStore>,
        backend: Arc<dyn GenerationBackend>,
        config: ShowConfig,
    ) -> Self {
        let client = GenerationClient::new(backend, config.scoring.clone());
        info!(backend = %client.backend_id(), show = %config.general.show_name, "Showrunner ready");

        Self {
            round_one: RoundOneScorer::new(Arc::clone(&store), client.clone()),
            synthesizer: CommunitySynthesizer::new(
                Arc::clone(&store),
                client.clone(),
                config.synthesis.clone(),
            ),
            producer: EpisodeProducer::new(
                Arc::clone(&store),
                client,
                config.episode.clone(),
                config.general.clone(),
            ),
            gate: EpisodeGate::from_config(&config.episode),
            store,
            config,
        }
    }

    pub fn config(&self) -> &ShowConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ShowStore> {
        &self.store
    }

    /// Attach research findings: `submitted → researched`.
    pub async fn attach_research(&self, submission_id: &str, research: &str) -> Result<SubmissionStatus> {
        let transition = Transition::AttachResearch;
        let status = self.precheck(submission_id, &transition).await?;
        self.store.attach_research(submission_id, research).await?;
        self.apply(submission_id, status, &transition).await
    }

    /// Round 1 for one submission.
    pub async fn score_submission(&self, submission_id: &str) -> Result<RoundOneReport> {
        self.round_one.score_submission(submission_id).await
    }

    /// Round 1 for every researched submission.
    pub async fn score_researched(&self) -> Result<BatchReport<RoundOneReport>> {
        self.round_one.score_batch().await
    }

    /// Open community voting: `scored → community_voting`.
    pub async fn open_voting(&self, submission_id: &str) -> Result<SubmissionStatus> {
        let transition = Transition::OpenVoting;
        let status = self.precheck(submission_id, &transition).await?;
        self.apply(submission_id, status, &transition).await
    }

    /// Finish without community voting: `scored → completed`.
    pub async fn complete_without_voting(&self, submission_id: &str) -> Result<SubmissionStatus> {
        let scored: BTreeSet<Judge> = self
            .store
            .scores(submission_id, Round::One)
            .await?
            .iter()
            .map(|s| s.judge)
            .collect();
        let transition = Transition::CompleteWithoutVoting { scored };
        let status = self.precheck(submission_id, &transition).await?;
        self.apply(submission_id, status, &transition).await
    }

    /// Round 2 over an explicit cohort.
    pub async fn synthesize(&self, cohort: &[String]) -> Result<BatchReport<SynthesisReport>> {
        self.synthesizer.synthesize(cohort).await
    }

    /// Round 2 over everything currently in community voting.
    pub async fn synthesize_voting(&self) -> Result<BatchReport<SynthesisReport>> {
        self.synthesizer.synthesize_voting().await
    }

    /// Generate and gate an episode for a completed submission.
    pub async fn produce_episode(&self, submission_id: &str) -> Result<EpisodeReview> {
        self.producer.produce(submission_id).await
    }

    /// Gate an externally generated episode script.
    pub fn review_episode_json(&self, raw: &str) -> EpisodeReview {
        self.gate.review_json(raw)
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        build_leaderboard(self.store.as_ref()).await
    }

    /// Current status, after confirming the transition may be taken.
    async fn precheck(&self, submission_id: &str, transition: &Transition) -> Result<SubmissionStatus> {
        let status = self.store.submission(submission_id).await?.status;
        match lifecycle::check(status, transition) {
            Ok(_) => Ok(status),
            Err(LifecycleViolation { status, .. }) if status != transition.source() => {
                Err(ShowError::WrongStatus {
                    submission_id: submission_id.to_string(),
                    status,
                    expected: transition.source(),
                })
            }
            Err(violation) => Err(ShowError::NotReady {
                submission_id: submission_id.to_string(),
                reason: violation.reason,
            }),
        }
    }

    async fn apply(
        &self,
        submission_id: &str,
        status: SubmissionStatus,
        transition: &Transition,
    ) -> Result<SubmissionStatus> {
        let next = lifecycle::advance(status, transition);
        self.store.set_status(submission_id, next).await?;
        info!(
            submission_id = %submission_id,
            transition = transition.name(),
            status = %next,
            "Status advanced"
        );
        Ok(next)
    }
}
