//! The fixed episode format: scene template, cast roster and canonical casts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use panel::Judge;
use serde::{Deserialize, Serialize};

use crate::config::EpisodeConfig;

/// Scene types in broadcast order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Teaser,
    IntroPitch,
    Interview,
    PitchConclusion,
    Deliberation,
    Verdicts,
    Outro,
}

impl SceneKind {
    /// The episode template.
    pub const TEMPLATE: [SceneKind; 7] = [
        SceneKind::Teaser,
        SceneKind::IntroPitch,
        SceneKind::Interview,
        SceneKind::PitchConclusion,
        SceneKind::Deliberation,
        SceneKind::Verdicts,
        SceneKind::Outro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teaser => "teaser",
            Self::IntroPitch => "intro_pitch",
            Self::Interview => "interview",
            Self::PitchConclusion => "pitch_conclusion",
            Self::Deliberation => "deliberation",
            Self::Verdicts => "verdicts",
            Self::Outro => "outro",
        }
    }

    /// Location a scene of this type is set in.
    pub fn location(&self) -> &'static str {
        match self {
            Self::Interview => "interview_room_solo",
            Self::Deliberation => "deliberation_room",
            Self::Teaser
            | Self::IntroPitch
            | Self::PitchConclusion
            | Self::Verdicts
            | Self::Outro => "main_stage",
        }
    }

    /// Scene type at a position, if the location matches the template there.
    pub fn recognize(index: usize, location: &str) -> Option<SceneKind> {
        Self::TEMPLATE
            .get(index)
            .copied()
            .filter(|kind| kind.location() == location)
    }

    /// Main-stage scenes seat the host, the pitcher and the whole panel.
    pub fn is_full_stage(&self) -> bool {
        matches!(self, Self::IntroPitch | Self::PitchConclusion | Self::Verdicts)
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A judge's closing call in the verdicts scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictToken {
    Pump,
    Dump,
    Yawn,
}

impl VerdictToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pump => "PUMP",
            Self::Dump => "DUMP",
            Self::Yawn => "YAWN",
        }
    }
}

impl fmt::Display for VerdictToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUMP" => Ok(Self::Pump),
            "DUMP" => Ok(Self::Dump),
            "YAWN" => Ok(Self::Yawn),
            other => Err(format!("not a verdict token: '{}'", other)),
        }
    }
}

/// Producer directive line texts.
pub const ROLL_VIDEO: &str = "roll-video";
pub const USER_AVATAR: &str = "user-avatar";

/// Slot names used by canonical casts.
pub const HOST_SLOT: &str = "host";
pub const PITCHER_SLOT: &str = "pitcher";
pub const INTERVIEWER_SLOT: &str = "interviewer";
pub const CONTESTANT_SLOT: &str = "contestant";

/// Canonical slot name for a judge's seat, e.g. `judge00`.
pub fn judge_slot(judge: Judge) -> String {
    format!("judge{:02}", judge.seat())
}

/// Character ids that appear in an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastRoster {
    pub host: String,
    pub pitcher: String,
    pub producer: String,
    /// Judge character ids in seat order
    pub judges: [String; 4],
}

impl CastRoster {
    pub fn from_config(config: &EpisodeConfig) -> Self {
        Self {
            host: config.host_id.clone(),
            pitcher: config.pitcher_id.clone(),
            producer: config.producer_id.clone(),
            judges: Judge::ALL.map(|j| j.character_id().to_string()),
        }
    }

    /// Same roster with a different pitching representative.
    pub fn with_pitcher(mut self, pitcher: impl Into<String>) -> Self {
        self.pitcher = pitcher.into();
        self
    }

    pub fn is_judge(&self, character: &str) -> bool {
        self.judges.iter().any(|j| j == character)
    }

    /// The cast a scene of this type must have after repair.
    pub fn canonical_cast(&self, kind: SceneKind) -> BTreeMap<String, String> {
        let mut cast = BTreeMap::new();
        let judges = || {
            Judge::ALL
                .into_iter()
                .zip(self.judges.iter())
                .map(|(judge, id)| (judge_slot(judge), id.clone()))
        };

        match kind {
            SceneKind::Teaser | SceneKind::Outro => {
                cast.insert(HOST_SLOT.to_string(), self.host.clone());
                cast.insert(PITCHER_SLOT.to_string(), self.pitcher.clone());
            }
            SceneKind::Interview => {
                cast.insert(INTERVIEWER_SLOT.to_string(), self.host.clone());
                cast.insert(CONTESTANT_SLOT.to_string(), self.pitcher.clone());
            }
            SceneKind::Deliberation => cast.extend(judges()),
            SceneKind::IntroPitch | SceneKind::PitchConclusion | SceneKind::Verdicts => {
                cast.insert(HOST_SLOT.to_string(), self.host.clone());
                cast.insert(PITCHER_SLOT.to_string(), self.pitcher.clone());
                cast.extend(judges());
            }
        }
        cast
    }
}

impl Default for CastRoster {
    fn default() -> Self {
        Self::from_config(&EpisodeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_by_position_and_location() {
        assert_eq!(SceneKind::recognize(2, "interview_room_solo"), Some(SceneKind::Interview));
        assert_eq!(SceneKind::recognize(2, "main_stage"), None);
        assert_eq!(SceneKind::recognize(4, "deliberation_room"), Some(SceneKind::Deliberation));
        assert_eq!(SceneKind::recognize(7, "main_stage"), None);
    }

    #[test]
    fn test_canonical_casts() {
        let roster = CastRoster::default();
        let verdicts = roster.canonical_cast(SceneKind::Verdicts);
        assert_eq!(verdicts.len(), 6);
        assert_eq!(verdicts["judge00"], "aimarc");
        assert_eq!(verdicts["host"], "eliza");

        let deliberation = roster.canonical_cast(SceneKind::Deliberation);
        assert_eq!(deliberation.len(), 4);
        assert!(!deliberation.values().any(|c| c == "eliza"));

        let interview = roster.canonical_cast(SceneKind::Interview);
        assert_eq!(interview["interviewer"], "eliza");
        assert_eq!(interview["contestant"], "pitchbot");
    }

    #[test]
    fn test_verdict_tokens_are_exact() {
        assert_eq!("PUMP".parse::<VerdictToken>(), Ok(VerdictToken::Pump));
        assert_eq!("YAWN".parse::<VerdictToken>(), Ok(VerdictToken::Yawn));
        assert!(" YAWN ".parse::<VerdictToken>().is_err());
        assert!(" PUMP\n".parse::<VerdictToken>().is_err());
        assert!("pump".parse::<VerdictToken>().is_err());
        assert!("HODL".parse::<VerdictToken>().is_err());
    }
}
