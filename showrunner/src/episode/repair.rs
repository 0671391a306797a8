//! Cast repair and dialogue fingerprinting.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use super::contract::SceneKind;
use super::types::EpisodeDraft;
use super::validator::{EpisodeValidator, SCENE_COUNT};

/// A scene whose cast was overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairedScene {
    pub index: usize,
    pub kind: SceneKind,
}

/// Overwrite the cast of every recognised scene whose cast breaks its rule.
///
/// Only runs on drafts with the full scene count. Dialogue is never touched.
pub fn repair_casts(draft: &mut EpisodeDraft, validator: &EpisodeValidator) -> Vec<RepairedScene> {
    if draft.scenes.len() != SCENE_COUNT {
        return Vec::new();
    }

    let mut repaired = Vec::new();
    for (index, scene) in draft.scenes.iter_mut().enumerate() {
        let Some(kind) = SceneKind::recognize(index, &scene.location) else {
            continue;
        };
        if validator.cast_problem(kind, &scene.cast).is_some() {
            scene.cast = validator.roster().canonical_cast(kind);
            info!(scene = index + 1, kind = %kind, "Scene cast replaced with canonical cast");
            repaired.push(RepairedScene { index, kind });
        }
    }
    repaired
}

/// SHA-256 over every dialogue line, in order.
pub fn dialogue_fingerprint(draft: &EpisodeDraft) -> String {
    let mut hasher = Sha256::new();

    for (index, scene) in draft.scenes.iter().enumerate() {
        hasher.update((index as u64).to_le_bytes());
        for line in &scene.dialogue {
            for field in [&line.actor, &line.line, &line.action] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
    }

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::contract::CastRoster;
    use crate::episode::validator::tests::valid_draft;

    fn validator() -> EpisodeValidator {
        EpisodeValidator::new(CastRoster::default(), "https://cdn.discordapp.com/avatars/")
    }

    #[test]
    fn test_repair_fixes_only_broken_scenes() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes[4].cast.insert("host".into(), "eliza".into());
        let untouched = draft.scenes[1].cast.clone();
        let before = dialogue_fingerprint(&draft);

        let repaired = repair_casts(&mut draft, &validator);

        assert_eq!(repaired, vec![RepairedScene { index: 4, kind: SceneKind::Deliberation }]);
        assert_eq!(draft.scenes[4].cast.len(), 4);
        assert_eq!(draft.scenes[1].cast, untouched);
        assert_eq!(dialogue_fingerprint(&draft), before);
    }

    #[test]
    fn test_no_repair_without_full_scene_count() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        draft.scenes.pop();
        draft.scenes[0].cast.clear();

        assert!(repair_casts(&mut draft, &validator).is_empty());
        assert!(draft.scenes[0].cast.is_empty());
    }

    #[test]
    fn test_fingerprint_sees_dialogue_changes() {
        let validator = validator();
        let mut draft = valid_draft(validator.roster());
        let before = dialogue_fingerprint(&draft);

        draft.scenes[0].cast.clear();
        assert_eq!(dialogue_fingerprint(&draft), before);

        draft.scenes[0].dialogue[0].line.push('!');
        assert_ne!(dialogue_fingerprint(&draft), before);
    }
}
