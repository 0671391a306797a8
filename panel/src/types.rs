//! Core types for the judging panel.
//!
//! These types model the fixed four-judge roster, the four scoring criteria
//! and the per-round score records written for every submission.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the episode renderer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::community::ReactionTally;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Errors raised when decoding panel identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Character id does not belong to any judge
    #[error("Unknown judge: {0}")]
    UnknownJudge(String),

    /// Reaction category not recognised
    #[error("Unknown reaction category: {0}")]
    UnknownReaction(String),

    /// Round number outside 1..=2
    #[error("Invalid round: {0}")]
    InvalidRound(u8),
}

/// The judges sitting on the panel.
///
/// The roster is closed: every lookup keyed by judge is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum Judge {
    /// Visionary venture capitalist, cares about market size
    #[serde(rename = "aimarc")]
    Marc,
    /// Builder and open-source maintainer, cares about the code
    #[serde(rename = "aishaw")]
    Shaw,
    /// Trader, cares about money and staying power
    #[serde(rename = "spartan")]
    Spartan,
    /// Community frog, cares about vibes and usability
    #[serde(rename = "peepo")]
    Peepo,
}

impl Judge {
    /// Every judge, in panel seating order.
    pub const ALL: [Judge; 4] = [Judge::Marc, Judge::Shaw, Judge::Spartan, Judge::Peepo];

    /// Canonical character identifier used in episodes and records.
    pub fn character_id(&self) -> &'static str {
        match self {
            Self::Marc => "aimarc",
            Self::Shaw => "aishaw",
            Self::Spartan => "spartan",
            Self::Peepo => "peepo",
        }
    }

    /// On-air display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Marc => "AI Marc",
            Self::Shaw => "AI Shaw",
            Self::Spartan => "Degen Spartan",
            Self::Peepo => "Peepo",
        }
    }

    /// Seat index (0-3), used for cast slot names.
    pub fn seat(&self) -> usize {
        match self {
            Self::Marc => 0,
            Self::Shaw => 1,
            Self::Spartan => 2,
            Self::Peepo => 3,
        }
    }

    /// Look up a judge by character id.
    pub fn from_character_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.character_id() == id)
    }
}

impl fmt::Display for Judge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.character_id())
    }
}

impl FromStr for Judge {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_character_id(s.trim()).ok_or_else(|| PanelError::UnknownJudge(s.to_string()))
    }
}

/// Scoring criteria every judge rates on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Innovation,
    TechnicalExecution,
    MarketPotential,
    UserExperience,
}

impl Criterion {
    /// All criteria in reply order.
    pub const ALL: [Criterion; 4] = [
        Criterion::Innovation,
        Criterion::TechnicalExecution,
        Criterion::MarketPotential,
        Criterion::UserExperience,
    ];

    /// Label stem used in the reply format (`<STEM>_SCORE`, `<STEM>_REASON`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Innovation => "INNOVATION",
            Self::TechnicalExecution => "TECHNICAL",
            Self::MarketPotential => "MARKET",
            Self::UserExperience => "EXPERIENCE",
        }
    }

    /// Human-readable name for prompts.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Innovation => "Innovation & Creativity",
            Self::TechnicalExecution => "Technical Execution",
            Self::MarketPotential => "Market Potential",
            Self::UserExperience => "User Experience",
        }
    }

    /// Score label as it must appear in a reply.
    pub fn score_label(&self) -> String {
        format!("{}_SCORE", self.label())
    }

    /// Reason label as it must appear in a reply.
    pub fn reason_label(&self) -> String {
        format!("{}_REASON", self.label())
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One value per criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PerCriterion<T> {
    pub innovation: T,
    pub technical_execution: T,
    pub market_potential: T,
    pub user_experience: T,
}

impl<T> PerCriterion<T> {
    /// Build from a function of the criterion.
    pub fn from_fn(mut f: impl FnMut(Criterion) -> T) -> Self {
        Self {
            innovation: f(Criterion::Innovation),
            technical_execution: f(Criterion::TechnicalExecution),
            market_potential: f(Criterion::MarketPotential),
            user_experience: f(Criterion::UserExperience),
        }
    }

    pub fn get(&self, criterion: Criterion) -> &T {
        match criterion {
            Criterion::Innovation => &self.innovation,
            Criterion::TechnicalExecution => &self.technical_execution,
            Criterion::MarketPotential => &self.market_potential,
            Criterion::UserExperience => &self.user_experience,
        }
    }

    pub fn get_mut(&mut self, criterion: Criterion) -> &mut T {
        match criterion {
            Criterion::Innovation => &mut self.innovation,
            Criterion::TechnicalExecution => &mut self.technical_execution,
            Criterion::MarketPotential => &mut self.market_potential,
            Criterion::UserExperience => &mut self.user_experience,
        }
    }

    /// Iterate `(criterion, value)` pairs in reply order.
    pub fn iter(&self) -> impl Iterator<Item = (Criterion, &T)> {
        Criterion::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Raw integer scores, each clamped to 0-10.
pub type CriterionScores = PerCriterion<u8>;

/// Score given to a criterion that could not be read from a reply.
pub const NEUTRAL_SCORE: u8 = 5;

/// Highest score a judge can give a single criterion.
pub const MAX_CRITERION_SCORE: u8 = 10;

impl CriterionScores {
    /// Build scores, clamping each into range.
    pub fn clamped(innovation: i64, technical: i64, market: i64, experience: i64) -> Self {
        let clamp = |v: i64| v.clamp(0, i64::from(MAX_CRITERION_SCORE)) as u8;
        Self {
            innovation: clamp(innovation),
            technical_execution: clamp(technical),
            market_potential: clamp(market),
            user_experience: clamp(experience),
        }
    }

    /// All criteria at the neutral score.
    pub fn neutral() -> Self {
        Self::from_fn(|_| NEUTRAL_SCORE)
    }
}

/// Scoring round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(into = "u8", try_from = "u8")]
pub enum Round {
    /// Independent judge evaluation
    One,
    /// Final verdict after community voting
    Two,
}

impl Round {
    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl From<Round> for u8 {
    fn from(round: Round) -> Self {
        round.number()
    }
}

impl TryFrom<u8> for Round {
    type Error = PanelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(PanelError::InvalidRound(other)),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.number())
    }
}

/// Uniqueness key of a score record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScoreKey {
    pub submission_id: String,
    pub judge: Judge,
    pub round: Round,
}

impl fmt::Display for ScoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.submission_id, self.judge, self.round.number())
    }
}

/// A judge's score record for one submission and round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct JudgeScore {
    pub submission_id: String,
    pub judge: Judge,
    pub round: Round,
    /// Raw criterion scores (Round 2 carries the Round 1 values)
    pub scores: CriterionScores,
    /// Weighted total, rounded to 2 decimals
    pub weighted_total: f64,
    pub notes: ScoreNotes,
    pub created_at: DateTime<Utc>,
}

impl JudgeScore {
    pub fn key(&self) -> ScoreKey {
        ScoreKey {
            submission_id: self.submission_id.clone(),
            judge: self.judge,
            round: self.round,
        }
    }

    /// Whether this record was produced by a fallback path.
    pub fn is_fallback(&self) -> bool {
        match &self.notes {
            ScoreNotes::Evaluation(notes) => notes.error.is_some(),
            ScoreNotes::Verdict(notes) => notes.fallback,
        }
    }
}

/// Structured notes attached to a score record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreNotes {
    /// Round 1 evaluation
    Evaluation(EvaluationNotes),
    /// Round 2 verdict
    Verdict(VerdictNotes),
}

/// Reasoning behind a Round 1 evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EvaluationNotes {
    pub reasons: PerCriterion<String>,
    pub overall_comment: String,
    /// Criteria whose score label was missing and defaulted to neutral
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<Criterion>,
    /// Generation error, set when the whole record is a neutral fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final verdict after community voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct VerdictNotes {
    pub verdict: String,
    pub round_one_total: f64,
    pub community_bonus: f64,
    pub reactions: ReactionTally,
    /// True when the verdict text is the templated fallback
    pub fallback: bool,
}

/// Project fields of a submission as the judges see them.
///
/// The submission form is versioned; fields the panel does not interpret are
/// carried in `extra` and shown to judges verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectFields {
    pub project_name: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub demo_video_url: Option<String>,
    #[serde(default)]
    pub live_demo_url: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl ProjectFields {
    pub fn new(project_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Links present on the submission, labelled.
    pub fn links(&self) -> Vec<(&'static str, &str)> {
        [
            ("GitHub", self.github_url.as_deref()),
            ("Demo video", self.demo_video_url.as_deref()),
            ("Live demo", self.live_demo_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.filter(|u| !u.trim().is_empty()).map(|u| (label, u)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_ids_round_trip() {
        for judge in Judge::ALL {
            assert_eq!(judge.character_id().parse::<Judge>(), Ok(judge));
        }
        assert!("eliza".parse::<Judge>().is_err());
    }

    #[test]
    fn test_judge_serializes_as_character_id() {
        let json = serde_json::to_string(&Judge::Spartan).unwrap();
        assert_eq!(json, "\"spartan\"");
    }

    #[test]
    fn test_clamped_scores() {
        let scores = CriterionScores::clamped(-3, 11, 7, 10);
        assert_eq!(scores.innovation, 0);
        assert_eq!(scores.technical_execution, 10);
        assert_eq!(scores.market_potential, 7);
        assert_eq!(scores.user_experience, 10);
    }

    #[test]
    fn test_round_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Round::Two).unwrap(), "2");
        let round: Round = serde_json::from_str("1").unwrap();
        assert_eq!(round, Round::One);
        assert!(serde_json::from_str::<Round>("3").is_err());
    }

    #[test]
    fn test_per_criterion_iteration_order() {
        let labels: Vec<_> = CriterionScores::neutral()
            .iter()
            .map(|(c, _)| c.label())
            .collect();
        assert_eq!(labels, ["INNOVATION", "TECHNICAL", "MARKET", "EXPERIENCE"]);
    }
}
