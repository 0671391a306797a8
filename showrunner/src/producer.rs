//! Episode production: prompt the script writer, then gate the result.

use std::sync::Arc;

use panel::{JudgeScore, Round, ScoreNotes};
use studio_agent::{GenerationPurpose, GenerationRequest};
use tracing::{debug, info};

use crate::config::{EpisodeConfig, GeneralConfig};
use crate::episode::contract::{
    judge_slot, CastRoster, SceneKind, CONTESTANT_SLOT, HOST_SLOT, INTERVIEWER_SLOT, PITCHER_SLOT,
    ROLL_VIDEO, USER_AVATAR,
};
use crate::episode::{EpisodeGate, EpisodeReview};
use crate::generation::GenerationClient;
use crate::lifecycle::SubmissionStatus;
use crate::store::ShowStore;
use crate::types::{Result, ShowError, Submission};

/// Generates and gates episode scripts for completed submissions.
pub struct EpisodeProducer {
    store: Arc<dyn ShowStore>,
    client: GenerationClient,
    episode: EpisodeConfig,
    general: GeneralConfig,
}

impl EpisodeProducer {
    pub fn new(
        store: Arc<dyn ShowStore>,
        client: GenerationClient,
        episode: EpisodeConfig,
        general: GeneralConfig,
    ) -> Self {
        Self {
            store,
            client,
            episode,
            general,
        }
    }

    /// Generate one episode and run it through the gate.
    ///
    /// One generation attempt is made; a rejected episode is returned as
    /// such and regenerating is the caller's decision.
    pub async fn produce(&self, submission_id: &str) -> Result<EpisodeReview> {
        let submission = self.store.submission(submission_id).await?;
        if submission.status != SubmissionStatus::Completed {
            return Err(ShowError::WrongStatus {
                submission_id: submission_id.to_string(),
                status: submission.status,
                expected: SubmissionStatus::Completed,
            });
        }

        let mut scores = self.store.scores(submission_id, Round::Two).await?;
        if scores.is_empty() {
            scores = self.store.scores(submission_id, Round::One).await?;
        }

        let roster = CastRoster::from_config(&self.episode);
        let (system, user) = build_episode_prompt(&self.general, &self.episode, &roster, &submission, &scores);
        debug!(submission_id = %submission_id, prompt_chars = user.len(), "Episode prompt built");

        let request = GenerationRequest::user(user)
            .with_system(system)
            .for_purpose(GenerationPurpose::Episode)
            .with_max_tokens(self.episode.max_tokens)
            .with_temperature(self.episode.temperature)
            .with_json_output();
        let generation = self.client.generate(request).await?;

        let gate = EpisodeGate::with_roster(roster, &self.episode);
        let review = gate.review_json(&generation.content);
        info!(
            submission_id = %submission_id,
            accepted = review.accepted,
            repaired = review.repaired_scenes.len(),
            "Episode reviewed"
        );
        Ok(review)
    }
}

/// Build the system/user prompt pair for an episode script.
pub fn build_episode_prompt(
    general: &GeneralConfig,
    episode: &EpisodeConfig,
    roster: &CastRoster,
    submission: &Submission,
    scores: &[JudgeScore],
) -> (String, String) {
    let mut system = String::new();
    system.push_str(&format!("# {} EPISODE WRITER\n\n", general.show_name.to_uppercase()));
    system.push_str("You write episode scripts for a hackathon judging game show.\n");
    system.push_str("Reply with a single JSON object and nothing else.\n\n");
    system.push_str("The object has a \"scenes\" array of exactly 7 scenes, in this order:\n");
    for (index, kind) in SceneKind::TEMPLATE.iter().enumerate() {
        let cast = roster
            .canonical_cast(*kind)
            .into_iter()
            .map(|(slot, id)| format!("{}: {}", slot, id))
            .collect::<Vec<_>>()
            .join(", ");
        system.push_str(&format!(
            "{}. {} (location \"{}\"; cast {{{}}})\n",
            index + 1,
            kind,
            kind.location(),
            cast
        ));
    }
    system.push_str(
        "\nEach scene has \"location\", \"description\", \"in\", \"out\", \"cast\" \
         (slot -> character id) and \"dialogue\" (a list of {\"actor\", \"line\", \"action\"}).\n",
    );
    system.push_str(&format!(
        "Use the slot names {}, {}, {}, {} and {}..{} exactly as listed.\n",
        HOST_SLOT,
        PITCHER_SLOT,
        INTERVIEWER_SLOT,
        CONTESTANT_SLOT,
        judge_slot(panel::Judge::ALL[0]),
        judge_slot(panel::Judge::ALL[3]),
    ));
    system.push_str(&format!(
        "\nIn the verdicts scene every judge ends with a line whose action is PUMP, DUMP or YAWN.\n\
         The producer \"{}\" is never cast. It may speak at most one line \"{}\" with a video URL \
         as action and at most one line \"{}\" with an avatar URL starting with {} as action.\n",
        roster.producer, ROLL_VIDEO, USER_AVATAR, episode.avatar_url_prefix
    ));

    let project = &submission.project;
    let mut user = String::new();
    user.push_str(&format!("# PROJECT: {}\n\n", project.project_name));
    if !project.team_name.is_empty() {
        user.push_str(&format!("Team: {}\n", project.team_name));
    }
    if !project.category.is_empty() {
        user.push_str(&format!("Category: {}\n", project.category));
    }
    user.push_str(&format!("\n{}\n", project.description));
    if let Some(video) = project.demo_video_url.as_deref().filter(|u| !u.is_empty()) {
        user.push_str(&format!("\nDemo video: {}\n", video));
    }

    user.push_str("\n# JUDGES\n\n");
    for score in scores {
        user.push_str(&format!(
            "- {} ({}): {:.2}",
            score.judge.display_name(),
            score.judge.character_id(),
            score.weighted_total
        ));
        match &score.notes {
            ScoreNotes::Verdict(notes) => user.push_str(&format!(" - {}\n", notes.verdict)),
            ScoreNotes::Evaluation(notes) if !notes.overall_comment.is_empty() => {
                user.push_str(&format!(" - {}\n", notes.overall_comment))
            }
            ScoreNotes::Evaluation(_) => user.push('\n'),
        }
    }

    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::episode::validator::tests::valid_draft;
    use crate::store::MemoryStore;
    use panel::{Judge, ProjectFields, ReactionTally, ScoringEngine};
    use studio_agent::{MockBackend, ResponseFormat};

    async fn completed_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut submission = Submission::new("sub-1", ProjectFields::new("Agent Bazaar", "Agents."));
        submission.status = SubmissionStatus::Completed;
        store.insert_submission(submission).unwrap();
        for judge in Judge::ALL {
            let r1 = ScoringEngine::neutral_fallback("sub-1", judge, "seed");
            store
                .insert_score(ScoringEngine::verdict(&r1, 1.5, ReactionTally::default(), "Ship it.", false))
                .await
                .unwrap();
        }
        store
    }

    fn producer(store: Arc<MemoryStore>, backend: Arc<MockBackend>) -> EpisodeProducer {
        let config = ScoringConfig {
            retry_count: 0,
            ..ScoringConfig::default()
        };
        EpisodeProducer::new(
            store,
            GenerationClient::new(backend, config),
            EpisodeConfig::default(),
            GeneralConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_produce_accepts_valid_script() {
        let store = completed_store().await;
        let script = valid_draft(&CastRoster::default()).to_json().unwrap();
        let backend = Arc::new(MockBackend::default().with_response(script));

        let review = producer(store, backend.clone()).produce("sub-1").await.unwrap();
        assert!(review.accepted);

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].response_format, ResponseFormat::Json);
        assert!(requests[0].prompt_text().contains("Ship it."));
    }

    #[tokio::test]
    async fn test_produce_reports_garbage_as_rejection() {
        let store = completed_store().await;
        let backend = Arc::new(MockBackend::default().with_response("I cannot write that."));

        let review = producer(store, backend.clone()).produce("sub-1").await.unwrap();
        assert!(!review.accepted);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_produce_requires_completed_submission() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_submission(Submission::new("sub-1", ProjectFields::new("A", "B")))
            .unwrap();
        let err = producer(store, Arc::new(MockBackend::default()))
            .produce("sub-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ShowError::WrongStatus { .. }));
    }

    #[test]
    fn test_prompt_lists_template() {
        let submission = Submission::new("sub-1", ProjectFields::new("Agent Bazaar", "Agents."));
        let (system, user) = build_episode_prompt(
            &GeneralConfig::default(),
            &EpisodeConfig::default(),
            &CastRoster::default(),
            &submission,
            &[],
        );
        for kind in SceneKind::TEMPLATE {
            assert!(system.contains(kind.location()));
            assert!(system.contains(kind.as_str()));
        }
        assert!(system.contains("deliberation_room"));
        assert!(user.contains("Agent Bazaar"));
    }
}
