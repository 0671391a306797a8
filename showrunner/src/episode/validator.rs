//! Structural validation of episode drafts.
//!
//! Validation never fails: every problem found in present-but-malformed data
//! is reported as a [`Violation`], and an empty list means the draft is valid.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::contract::{
    CastRoster, SceneKind, VerdictToken, CONTESTANT_SLOT, INTERVIEWER_SLOT, ROLL_VIDEO,
    USER_AVATAR,
};
use super::types::{EpisodeDraft, Scene};

/// Expected number of scenes.
pub const SCENE_COUNT: usize = SceneKind::TEMPLATE.len();

/// Category of a broken rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Wrong number of scenes
    SceneCount,
    /// Scene location does not match the template position
    SceneOrder,
    /// Cast does not match the scene type; repairable
    Cast,
    /// Producer appears in a cast
    ProducerInCast,
    /// Malformed, repeated or unexpected producer line
    ProducerDirective,
    /// Missing or invalid judge verdict
    VerdictAction,
    /// Draft could not be decoded at all
    Decode,
}

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Scene index, when the violation belongs to one scene
    pub scene: Option<usize>,
    pub message: String,
}

impl Violation {
    fn new(kind: ViolationKind, scene: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            scene,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Decode, None, message)
    }

    /// Whether the repair pass can fix this.
    pub fn is_repairable(&self) -> bool {
        self.kind == ViolationKind::Cast
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scene {
            Some(index) => write!(f, "scene {}: {}", index + 1, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Checks drafts against the episode format.
#[derive(Debug, Clone)]
pub struct EpisodeValidator {
    roster: CastRoster,
    avatar_url_prefix: String,
}

impl EpisodeValidator {
    pub fn new(roster: CastRoster, avatar_url_prefix: impl Into<String>) -> Self {
        Self {
            roster,
            avatar_url_prefix: avatar_url_prefix.into(),
        }
    }

    pub fn roster(&self) -> &CastRoster {
        &self.roster
    }

    /// All violations in a draft; empty means valid.
    pub fn validate(&self, draft: &EpisodeDraft) -> Vec<Violation> {
        let mut violations = Vec::new();

        if draft.scenes.len() != SCENE_COUNT {
            violations.push(Violation::new(
                ViolationKind::SceneCount,
                None,
                format!("expected {} scenes, found {}", SCENE_COUNT, draft.scenes.len()),
            ));
        }

        for (index, scene) in draft.scenes.iter().enumerate() {
            match SceneKind::recognize(index, &scene.location) {
                Some(kind) => {
                    if let Some(problem) = self.cast_problem(kind, &scene.cast) {
                        violations.push(Violation::new(
                            ViolationKind::Cast,
                            Some(index),
                            format!("{} cast {}", kind, problem),
                        ));
                    }
                    if kind == SceneKind::Verdicts {
                        self.check_verdicts(index, scene, &mut violations);
                    }
                }
                None => {
                    if let Some(expected) = SceneKind::TEMPLATE.get(index) {
                        violations.push(Violation::new(
                            ViolationKind::SceneOrder,
                            Some(index),
                            format!(
                                "expected {} at location '{}', found '{}'",
                                expected,
                                expected.location(),
                                scene.location
                            ),
                        ));
                    }
                }
            }

            if scene.casts(&self.roster.producer) {
                violations.push(Violation::new(
                    ViolationKind::ProducerInCast,
                    Some(index),
                    format!("producer '{}' must not be cast", self.roster.producer),
                ));
            }
        }

        self.check_producer_lines(draft, &mut violations);
        violations
    }

    /// Why a cast breaks the rule for its scene type, if it does.
    pub fn cast_problem(&self, kind: SceneKind, cast: &BTreeMap<String, String>) -> Option<String> {
        if let Some(slot) = cast.iter().find(|(_, id)| id.trim().is_empty()).map(|(slot, _)| slot) {
            return Some(format!("slot '{}' has no character", slot));
        }

        let roster = &self.roster;
        let members: BTreeSet<&str> = cast.values().map(String::as_str).collect();

        match kind {
            SceneKind::IntroPitch | SceneKind::PitchConclusion | SceneKind::Verdicts => {
                let missing: Vec<&str> = [roster.host.as_str(), roster.pitcher.as_str()]
                    .into_iter()
                    .chain(roster.judges.iter().map(String::as_str))
                    .filter(|id| !members.contains(id))
                    .collect();
                (!missing.is_empty()).then(|| format!("is missing {}", missing.join(", ")))
            }
            SceneKind::Deliberation => {
                let judges: BTreeSet<&str> = roster.judges.iter().map(String::as_str).collect();
                (cast.len() != judges.len() || members != judges)
                    .then(|| "must be exactly the four judges".to_string())
            }
            SceneKind::Teaser | SceneKind::Outro => {
                let expected: BTreeSet<&str> = [roster.host.as_str(), roster.pitcher.as_str()].into();
                (cast.len() != 2 || members != expected)
                    .then(|| "must be exactly the host and the pitcher".to_string())
            }
            SceneKind::Interview => {
                let ok = cast.len() == 2
                    && cast.get(INTERVIEWER_SLOT) == Some(&roster.host)
                    && cast.get(CONTESTANT_SLOT) == Some(&roster.pitcher);
                (!ok).then(|| {
                    format!(
                        "must be exactly {} -> {}, {} -> {}",
                        INTERVIEWER_SLOT, roster.host, CONTESTANT_SLOT, roster.pitcher
                    )
                })
            }
        }
    }

    /// Each judge's last line in the verdicts scene must carry a verdict token.
    fn check_verdicts(&self, index: usize, scene: &Scene, violations: &mut Vec<Violation>) {
        for judge in &self.roster.judges {
            let last = scene.dialogue.iter().rev().find(|line| &line.actor == judge);
            let problem = match last {
                None => Some(format!("judge '{}' gives no verdict", judge)),
                Some(line) => line.action.parse::<VerdictToken>().err().map(|_| {
                    format!(
                        "judge '{}' verdict action '{}' is not PUMP, DUMP or YAWN",
                        judge, line.action
                    )
                }),
            };
            if let Some(message) = problem {
                violations.push(Violation::new(ViolationKind::VerdictAction, Some(index), message));
            }
        }
    }

    /// At most one well-formed `roll-video` and one `user-avatar`; nothing else.
    fn check_producer_lines(&self, draft: &EpisodeDraft, violations: &mut Vec<Violation>) {
        let mut roll_video = 0;
        let mut user_avatar = 0;

        for (index, scene) in draft.scenes.iter().enumerate() {
            for line in scene.dialogue.iter().filter(|l| l.actor == self.roster.producer) {
                let problem = match line.line.as_str() {
                    ROLL_VIDEO => {
                        roll_video += 1;
                        if roll_video > 1 {
                            Some(format!("more than one {} directive", ROLL_VIDEO))
                        } else if !is_http_url(&line.action) {
                            Some(format!("{} action '{}' is not an http(s) URL", ROLL_VIDEO, line.action))
                        } else {
                            None
                        }
                    }
                    USER_AVATAR => {
                        user_avatar += 1;
                        if user_avatar > 1 {
                            Some(format!("more than one {} directive", USER_AVATAR))
                        } else if !line.action.starts_with(&self.avatar_url_prefix) {
                            Some(format!(
                                "{} action '{}' does not start with '{}'",
                                USER_AVATAR, line.action, self.avatar_url_prefix
                            ))
                        } else {
                            None
                        }
                    }
                    other => Some(format!("unexpected producer line '{}'", other)),
                };
                if let Some(message) = problem {
                    violations.push(Violation::new(
                        ViolationKind::ProducerDirective,
                        Some(index),
                        message,
                    ));
                }
            }
        }
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::episode::types::DialogueLine;

    /// A draft that satisfies every rule.
    pub(crate) fn valid_draft(roster: &CastRoster) -> EpisodeDraft {
        let scenes = SceneKind::TEMPLATE
            .iter()
            .map(|kind| {
                let mut scene = Scene::new(kind.location());
                scene.cast = roster.canonical_cast(*kind);
                scene.dialogue.push(DialogueLine::new(&roster.host, format!("Now: {}", kind), "smile"));
                if *kind == SceneKind::Verdicts {
                    for (judge, token) in roster.judges.iter().zip(["PUMP", "DUMP", "YAWN", "PUMP"]) {
                        scene.dialogue.push(DialogueLine::new(judge, "My call.", token));
                    }
                }
                if *kind == SceneKind::IntroPitch {
                    scene.dialogue.push(DialogueLine::new(
                        &roster.producer,
                        ROLL_VIDEO,
                        "https://example.com/demo.mp4",
                    ));
                    scene.dialogue.push(DialogueLine::new(
                        &roster.producer,
                        USER_AVATAR,
                        "https://cdn.discordapp.com/avatars/1/abc.png",
                    ));
                }
                scene
            })
            .collect();
        EpisodeDraft::new(scenes)
    }

    fn validator() -> EpisodeValidator {
        EpisodeValidator::new(CastRoster::default(), "https://cdn.discordapp.com/avatars/")
    }

    #[test]
    fn test_valid_draft_has_no_violations() {
        let validator = validator();
        let draft = valid_draft(validator.roster());
        assert_eq!(validator.validate(&draft), vec![]);
    }

    #[test]
    fn test_host_in_deliberation_is_one_cast_violation() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes[4].cast.insert("host".into(), "eliza".into());

        let violations = validator.validate(&draft);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Cast);
        assert_eq!(violations[0].scene, Some(4));
    }

    #[test]
    fn test_six_scenes_fails_count() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes.pop();

        let violations = validator.validate(&draft);
        assert!(violations.iter().any(|v| v.kind == ViolationKind::SceneCount));
    }

    #[test]
    fn test_misplaced_scene_is_order_violation() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes.swap(2, 4);

        let kinds: Vec<ViolationKind> = validator.validate(&draft).iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::SceneOrder, ViolationKind::SceneOrder]);
    }

    #[test]
    fn test_interview_slots_matter() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        let cast = &mut draft.scenes[2].cast;
        cast.clear();
        cast.insert("interviewer".into(), "pitchbot".into());
        cast.insert("contestant".into(), "eliza".into());

        assert_eq!(validator.validate(&draft)[0].kind, ViolationKind::Cast);
    }

    #[test]
    fn test_main_stage_allows_extra_cast() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes[1].cast.insert("audience".into(), "crowd".into());
        assert!(validator.validate(&draft).is_empty());
    }

    #[test]
    fn test_empty_cast_slot_is_cast_violation() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes[3].cast.insert("audience".into(), String::new());

        let violations = validator.validate(&draft);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Cast);
        assert!(violations[0].message.contains("audience"));
    }

    #[test]
    fn test_producer_rules() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes[3].dialogue.push(DialogueLine::new("jin", ROLL_VIDEO, "ftp://nope"));
        draft.scenes[3].dialogue.push(DialogueLine::new("jin", "cut to commercial", ""));
        draft.scenes[0].cast.insert("extra".into(), "jin".into());

        let violations = validator.validate(&draft);
        let producer: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::ProducerDirective)
            .collect();
        assert_eq!(producer.len(), 2);
        assert!(violations.iter().any(|v| v.kind == ViolationKind::ProducerInCast));
    }

    #[test]
    fn test_bad_avatar_prefix() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes[1].dialogue[2].action = "https://evil.example/avatar.png".into();

        let violations = validator.validate(&draft);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ProducerDirective);
    }

    #[test]
    fn test_padded_verdict_token_is_rejected() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        let line = draft.scenes[5]
            .dialogue
            .iter_mut()
            .find(|l| l.actor == "aimarc")
            .unwrap();
        line.action = " PUMP\n".into();

        let violations = validator.validate(&draft);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::VerdictAction);
    }

    #[test]
    fn test_verdict_uses_last_judge_line() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        // A later aside without a token overrides the earlier verdict line.
        draft.scenes[5].dialogue.push(DialogueLine::new("aishaw", "Actually...", "shrug"));
        // Peepo never speaks.
        draft.scenes[5].dialogue.retain(|l| l.actor != "peepo");

        let violations = validator.validate(&draft);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::VerdictAction));
    }
}
