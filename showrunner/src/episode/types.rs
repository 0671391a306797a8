//! Episode document as produced by the script generator.
//!
//! Decoding is lenient below the top level: nulls and stray types in scene
//! fields decode to empty values so the validator can report on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A generated episode script.
///
/// Fields other than `scenes` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EpisodeDraft {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scenes: Vec<Scene>,
    #[serde(flatten)]
    #[cfg_attr(feature = "typescript", ts(skip))]
    pub extra: Map<String, Value>,
}

impl EpisodeDraft {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self {
            scenes,
            extra: Map::new(),
        }
    }

    /// Decode raw generator output.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One scene of an episode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Scene {
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Transition into the scene
    #[serde(
        rename = "in",
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_in: Option<String>,
    /// Transition out of the scene
    #[serde(
        rename = "out",
        default,
        deserialize_with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_out: Option<String>,
    /// Slot name to character id; a slot whose value is not a string is kept
    /// with an empty id
    #[serde(default, deserialize_with = "lenient_cast")]
    pub cast: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dialogue: Vec<DialogueLine>,
}

impl Scene {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_cast(mut self, slot: impl Into<String>, character: impl Into<String>) -> Self {
        self.cast.insert(slot.into(), character.into());
        self
    }

    pub fn with_line(mut self, line: DialogueLine) -> Self {
        self.dialogue.push(line);
        self
    }

    /// Whether a character holds any slot.
    pub fn casts(&self, character: &str) -> bool {
        self.cast.values().any(|c| c == character)
    }
}

/// One spoken line or producer directive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DialogueLine {
    #[serde(default, deserialize_with = "lenient_string")]
    pub actor: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub line: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: String,
}

impl DialogueLine {
    pub fn new(
        actor: impl Into<String>,
        line: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            line: line.into(),
            action: action.into(),
        }
    }
}

/// Strings pass through, `null` is empty and other scalars keep their JSON text.
fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(scalar_text)
}

fn lenient_option<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(scalar_text(other)),
    })
}

fn lenient_cast<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let Value::Object(slots) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(slots
        .into_iter()
        .map(|(slot, character)| match character {
            Value::String(id) => (slot, id),
            _ => (slot, String::new()),
        })
        .collect())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{
            "id": "S1E7",
            "premiseSummary": "Agents hire agents",
            "scenes": [{
                "location": "main_stage",
                "in": "fade",
                "cast": {"host": "eliza"},
                "dialogue": [{"actor": "eliza", "line": "Welcome!", "action": "wave"}]
            }]
        }"#;
        let draft = EpisodeDraft::from_json(json).unwrap();
        assert_eq!(draft.extra["id"], "S1E7");
        assert_eq!(draft.scenes[0].transition_in.as_deref(), Some("fade"));

        let encoded: Value = serde_json::from_str(&draft.to_json().unwrap()).unwrap();
        assert_eq!(encoded["premiseSummary"], "Agents hire agents");
        assert_eq!(encoded["scenes"][0]["in"], "fade");
    }

    #[test]
    fn test_missing_action_defaults_to_empty() {
        let line: DialogueLine = serde_json::from_str(r#"{"actor": "aimarc", "line": "Hm."}"#).unwrap();
        assert_eq!(line.action, "");
    }

    #[test]
    fn test_nulls_and_stray_types_decode_leniently() {
        let json = r#"{
            "scenes": [{
                "location": "main_stage",
                "description": null,
                "in": 3,
                "cast": {"host": "eliza", "pitcher": null, "judge00": 7},
                "dialogue": [
                    {"actor": "eliza", "line": null, "action": null},
                    {"actor": "aimarc", "line": 42, "action": true}
                ]
            }, {"location": "interview_room_solo", "cast": null, "dialogue": null}]
        }"#;
        let draft = EpisodeDraft::from_json(json).unwrap();
        let scene = &draft.scenes[0];
        assert_eq!(scene.description, None);
        assert_eq!(scene.transition_in.as_deref(), Some("3"));
        assert_eq!(scene.cast["host"], "eliza");
        assert_eq!(scene.cast["pitcher"], "");
        assert_eq!(scene.cast["judge00"], "");
        assert_eq!(scene.dialogue[0], DialogueLine::new("eliza", "", ""));
        assert_eq!(scene.dialogue[1], DialogueLine::new("aimarc", "42", "true"));
        assert!(draft.scenes[1].cast.is_empty());
        assert!(draft.scenes[1].dialogue.is_empty());
    }
}
