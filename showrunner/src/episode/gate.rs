//! Accept-or-reject gate for generated episodes.
//!
//! A draft is validated, repaired once, and validated again. Nothing else is
//! retried here; a rejected episode goes back to the caller.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::contract::CastRoster;
use super::repair::{dialogue_fingerprint, repair_casts, RepairedScene};
use super::types::EpisodeDraft;
use super::validator::{EpisodeValidator, Violation};
use crate::config::EpisodeConfig;

/// Outcome of reviewing one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReview {
    pub accepted: bool,
    /// The (possibly repaired) draft; `None` if it could not be decoded
    pub episode: Option<EpisodeDraft>,
    /// Violations found before repair
    pub initial_violations: Vec<Violation>,
    /// Violations remaining after repair; empty when accepted
    pub violations: Vec<Violation>,
    pub repaired_scenes: Vec<RepairedScene>,
    /// Dialogue fingerprints before and after repair
    pub fingerprint_before: String,
    pub fingerprint_after: String,
}

impl EpisodeReview {
    /// The accepted episode, if any.
    pub fn accepted_episode(&self) -> Option<&EpisodeDraft> {
        self.episode.as_ref().filter(|_| self.accepted)
    }

    /// Whether repair left every dialogue line byte-identical.
    pub fn dialogue_preserved(&self) -> bool {
        self.fingerprint_before == self.fingerprint_after
    }
}

/// Validates and repairs episode drafts.
#[derive(Debug, Clone)]
pub struct EpisodeGate {
    validator: EpisodeValidator,
}

impl EpisodeGate {
    pub fn new(validator: EpisodeValidator) -> Self {
        Self { validator }
    }

    pub fn from_config(config: &EpisodeConfig) -> Self {
        Self::with_roster(CastRoster::from_config(config), config)
    }

    /// Gate for a specific roster, e.g. one with the submission's pitcher.
    pub fn with_roster(roster: CastRoster, config: &EpisodeConfig) -> Self {
        Self::new(EpisodeValidator::new(roster, config.avatar_url_prefix.clone()))
    }

    pub fn validator(&self) -> &EpisodeValidator {
        &self.validator
    }

    /// Review a decoded draft.
    pub fn review(&self, mut draft: EpisodeDraft) -> EpisodeReview {
        let fingerprint_before = dialogue_fingerprint(&draft);
        let initial_violations = self.validator.validate(&draft);

        let repaired_scenes = if initial_violations.iter().any(Violation::is_repairable) {
            repair_casts(&mut draft, &self.validator)
        } else {
            Vec::new()
        };

        let violations = self.validator.validate(&draft);
        let fingerprint_after = dialogue_fingerprint(&draft);
        let accepted = violations.is_empty();

        if accepted {
            info!(
                scenes = draft.scenes.len(),
                repaired = repaired_scenes.len(),
                "Episode accepted"
            );
        } else {
            warn!(
                violations = violations.len(),
                repaired = repaired_scenes.len(),
                first = %violations[0],
                "Episode rejected"
            );
        }

        EpisodeReview {
            accepted,
            episode: Some(draft),
            initial_violations,
            violations,
            repaired_scenes,
            fingerprint_before,
            fingerprint_after,
        }
    }

    /// Review raw generator output. Undecodable input is rejected, not an error.
    pub fn review_json(&self, raw: &str) -> EpisodeReview {
        match EpisodeDraft::from_json(strip_code_fence(raw)) {
            Ok(draft) => self.review(draft),
            Err(e) => {
                let violation = Violation::decode(format!("episode JSON could not be decoded: {}", e));
                warn!(error = %e, "Episode rejected: undecodable");
                EpisodeReview {
                    accepted: false,
                    episode: None,
                    initial_violations: vec![violation.clone()],
                    violations: vec![violation],
                    repaired_scenes: Vec::new(),
                    fingerprint_before: String::new(),
                    fingerprint_after: String::new(),
                }
            }
        }
    }
}

/// Models often wrap JSON in a markdown code fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::types::DialogueLine;
    use crate::episode::validator::tests::valid_draft;
    use crate::episode::validator::ViolationKind;

    fn gate() -> EpisodeGate {
        EpisodeGate::from_config(&EpisodeConfig::default())
    }

    #[test]
    fn test_clean_draft_is_accepted_unchanged() {
        let gate = gate();
        let draft = valid_draft(gate.validator().roster());

        let review = gate.review(draft.clone());
        assert!(review.accepted);
        assert!(review.repaired_scenes.is_empty());
        assert_eq!(review.accepted_episode(), Some(&draft));
    }

    #[test]
    fn test_host_in_deliberation_is_repaired_and_accepted() {
        let gate = gate();
        let mut draft = valid_draft(gate.validator().roster());
        draft.scenes[4].cast.insert("host".into(), "eliza".into());
        draft.scenes[4]
            .dialogue
            .push(DialogueLine::new("aimarc", "Between us judges...", "lean"));
        let dialogue_before: Vec<_> = draft.scenes.iter().map(|s| s.dialogue.clone()).collect();

        let review = gate.review(draft);

        assert_eq!(review.initial_violations.len(), 1);
        assert!(review.accepted);
        assert_eq!(review.repaired_scenes.len(), 1);
        assert!(review.dialogue_preserved());
        let episode = review.accepted_episode().unwrap();
        assert_eq!(episode.scenes.len(), 7);
        let dialogue_after: Vec<_> = episode.scenes.iter().map(|s| s.dialogue.clone()).collect();
        assert_eq!(dialogue_after, dialogue_before);
        assert!(!episode.scenes[4].casts("eliza"));
    }

    #[test]
    fn test_six_scenes_rejected_after_repair_attempt() {
        let gate = gate();
        let mut draft = valid_draft(gate.validator().roster());
        draft.scenes.remove(2);

        let review = gate.review(draft);
        assert!(!review.accepted);
        assert!(review
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::SceneCount));
        assert!(review.accepted_episode().is_none());
    }

    #[test]
    fn test_producer_problems_are_not_repaired() {
        let gate = gate();
        let mut draft = valid_draft(gate.validator().roster());
        draft.scenes[1].dialogue[1].action = "not a url".into();

        let review = gate.review(draft);
        assert!(!review.accepted);
        assert_eq!(review.violations, review.initial_violations);
    }

    #[test]
    fn test_review_json_tolerates_null_fields() {
        let gate = gate();
        let draft = valid_draft(gate.validator().roster());
        let mut json: serde_json::Value = serde_json::from_str(&draft.to_json().unwrap()).unwrap();
        json["scenes"][0]["dialogue"][0]["action"] = serde_json::Value::Null;
        json["scenes"][0]["description"] = serde_json::Value::Null;

        let review = gate.review_json(&json.to_string());
        assert!(review.accepted, "{:?}", review.violations);
        assert_eq!(review.accepted_episode().unwrap().scenes[0].dialogue[0].action, "");
    }

    #[test]
    fn test_review_json_repairs_non_string_cast_value() {
        let gate = gate();
        let draft = valid_draft(gate.validator().roster());
        let mut json: serde_json::Value = serde_json::from_str(&draft.to_json().unwrap()).unwrap();
        json["scenes"][6]["cast"]["host"] = serde_json::json!(17);

        let review = gate.review_json(&json.to_string());
        assert_eq!(review.initial_violations.len(), 1);
        assert_eq!(review.initial_violations[0].kind, ViolationKind::Cast);
        assert_eq!(review.initial_violations[0].scene, Some(6));
        assert!(review.accepted);
        assert_eq!(review.repaired_scenes.len(), 1);
    }

    #[test]
    fn test_review_json_handles_fences_and_garbage() {
        let gate = gate();
        let draft = valid_draft(gate.validator().roster());
        let fenced = format!("```json\n{}\n```", draft.to_json().unwrap());
        assert!(gate.review_json(&fenced).accepted);

        let review = gate.review_json("the model refused");
        assert!(!review.accepted);
        assert_eq!(review.violations.len(), 1);
        assert_eq!(review.violations[0].kind, ViolationKind::Decode);
        assert!(review.episode.is_none());
    }
}
