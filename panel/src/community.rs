//! Community reactions and the Round 2 bonus.
//!
//! Reactions are only ever consumed as counts. The bonus for a submission is
//! its reaction total relative to the busiest submission of the cohort it is
//! synthesized with, scaled to [`MAX_COMMUNITY_BONUS`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::PanelError;
use crate::weights::round2;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Bonus awarded to the most-reacted submission of a cohort.
pub const MAX_COMMUNITY_BONUS: f64 = 2.0;

/// Kinds of reaction the community can leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ReactionCategory {
    Hype,
    Innovation,
    Technical,
    Market,
    Experience,
}

impl ReactionCategory {
    pub const ALL: [ReactionCategory; 5] = [
        ReactionCategory::Hype,
        ReactionCategory::Innovation,
        ReactionCategory::Technical,
        ReactionCategory::Market,
        ReactionCategory::Experience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hype => "hype",
            Self::Innovation => "innovation",
            Self::Technical => "technical",
            Self::Market => "market",
            Self::Experience => "experience",
        }
    }

    /// Emoji the community channel uses for this category.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Hype => "🔥",
            Self::Innovation => "💡",
            Self::Technical => "💻",
            Self::Market => "💰",
            Self::Experience => "❤️",
        }
    }
}

impl fmt::Display for ReactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionCategory {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.emoji() == s)
            .ok_or_else(|| PanelError::UnknownReaction(s.to_string()))
    }
}

/// A single community reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub submission_id: String,
    pub voter_id: String,
    pub category: ReactionCategory,
    pub reacted_at: DateTime<Utc>,
}

impl ReactionEvent {
    pub fn new(
        submission_id: impl Into<String>,
        voter_id: impl Into<String>,
        category: ReactionCategory,
    ) -> Self {
        Self {
            submission_id: submission_id.into(),
            voter_id: voter_id.into(),
            category,
            reacted_at: Utc::now(),
        }
    }
}

/// How raw reaction events are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePolicy {
    /// Every event counts
    #[default]
    CountAll,
    /// One event per voter and category
    DedupeVoterCategory,
    /// Only each voter's most recent event counts
    LatestPerVoter,
}

/// Reaction counts per category for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ReactionTally {
    pub counts: BTreeMap<ReactionCategory, u32>,
}

impl ReactionTally {
    /// Count events under the given policy.
    pub fn from_events<'a>(
        events: impl IntoIterator<Item = &'a ReactionEvent>,
        policy: VotePolicy,
    ) -> Self {
        let mut tally = Self::default();
        match policy {
            VotePolicy::CountAll => {
                for event in events {
                    tally.add(event.category, 1);
                }
            }
            VotePolicy::DedupeVoterCategory => {
                let mut seen = HashSet::new();
                for event in events {
                    if seen.insert((event.voter_id.as_str(), event.category)) {
                        tally.add(event.category, 1);
                    }
                }
            }
            VotePolicy::LatestPerVoter => {
                let mut latest: HashMap<&str, &ReactionEvent> = HashMap::new();
                for event in events {
                    let entry = latest.entry(event.voter_id.as_str()).or_insert(event);
                    if event.reacted_at >= entry.reacted_at {
                        *entry = event;
                    }
                }
                for event in latest.values() {
                    tally.add(event.category, 1);
                }
            }
        }
        tally
    }

    pub fn add(&mut self, category: ReactionCategory, count: u32) {
        *self.counts.entry(category).or_insert(0) += count;
    }

    pub fn count(&self, category: ReactionCategory) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Total reactions across all categories.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// One line per category, e.g. `🔥 hype: 4`.
    pub fn breakdown(&self) -> String {
        ReactionCategory::ALL
            .iter()
            .map(|c| format!("{} {}: {}", c.emoji(), c, self.count(*c)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Bonus for a submission with `total` reactions when the cohort maximum is `max`.
pub fn community_bonus(total: u32, max: u32) -> f64 {
    if max == 0 {
        return 0.0;
    }
    let ratio = f64::from(total.min(max)) / f64::from(max);
    MAX_COMMUNITY_BONUS * ratio
}

/// A group of submissions whose bonuses are normalized together.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    totals: BTreeMap<String, u32>,
}

impl Cohort {
    /// Build a cohort from `(submission_id, reaction_total)` pairs.
    pub fn new(members: impl IntoIterator<Item = (String, u32)>) -> Self {
        let cohort = Self {
            totals: members.into_iter().collect(),
        };
        if cohort.len() == 1 && cohort.max_reactions() > 0 {
            warn!(
                "Single-submission cohort: its bonus is always {} regardless of engagement",
                MAX_COMMUNITY_BONUS
            );
        }
        cohort
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn contains(&self, submission_id: &str) -> bool {
        self.totals.contains_key(submission_id)
    }

    pub fn max_reactions(&self) -> u32 {
        self.totals.values().copied().max().unwrap_or(0)
    }

    /// Bonus for a member of the cohort; `None` if it is not a member.
    pub fn bonus_for(&self, submission_id: &str) -> Option<f64> {
        let max = self.max_reactions();
        self.totals
            .get(submission_id)
            .map(|total| community_bonus(*total, max))
    }
}

/// Final Round 2 score: the Round 1 total plus the unweighted community bonus.
pub fn final_score(round_one_total: f64, bonus: f64) -> f64 {
    round2(round_one_total + bonus)
}
