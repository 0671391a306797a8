//! Submission lifecycle state machine.
//!
//! ```text
//! submitted ──► researched ──► scored ──► community_voting ──► completed
//!                                 │                                ▲
//!                                 └────────────────────────────────┘
//! ```
//!
//! Status only moves forward and `completed` is terminal. Each transition
//! carries the evidence its precondition needs. Taking a transition whose
//! precondition does not hold is a contract violation: [`advance`] panics,
//! while [`check`] reports the violation without side effects.

use std::collections::BTreeSet;
use std::fmt;

use panel::Judge;
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Lifecycle status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Researched,
    Scored,
    CommunityVoting,
    Completed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Researched => "researched",
            Self::Scored => "scored",
            Self::CommunityVoting => "community_voting",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested status change together with the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// `submitted → researched`
    AttachResearch,
    /// `researched → scored`; judges holding a Round 1 record
    CompleteRoundOne { scored: BTreeSet<Judge> },
    /// `scored → community_voting`
    OpenVoting,
    /// `community_voting → completed`
    CompleteRoundTwo {
        round_one: BTreeSet<Judge>,
        round_two: BTreeSet<Judge>,
    },
    /// `scored → completed`
    CompleteWithoutVoting { scored: BTreeSet<Judge> },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AttachResearch => "attach_research",
            Self::CompleteRoundOne { .. } => "complete_round_one",
            Self::OpenVoting => "open_voting",
            Self::CompleteRoundTwo { .. } => "complete_round_two",
            Self::CompleteWithoutVoting { .. } => "complete_without_voting",
        }
    }

    /// Status the transition starts from.
    pub fn source(&self) -> SubmissionStatus {
        match self {
            Self::AttachResearch => SubmissionStatus::Submitted,
            Self::CompleteRoundOne { .. } => SubmissionStatus::Researched,
            Self::OpenVoting => SubmissionStatus::Scored,
            Self::CompleteRoundTwo { .. } => SubmissionStatus::CommunityVoting,
            Self::CompleteWithoutVoting { .. } => SubmissionStatus::Scored,
        }
    }

    /// Status the transition leads to.
    pub fn target(&self) -> SubmissionStatus {
        match self {
            Self::AttachResearch => SubmissionStatus::Researched,
            Self::CompleteRoundOne { .. } => SubmissionStatus::Scored,
            Self::OpenVoting => SubmissionStatus::CommunityVoting,
            Self::CompleteRoundTwo { .. } | Self::CompleteWithoutVoting { .. } => {
                SubmissionStatus::Completed
            }
        }
    }
}

/// A transition whose precondition does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {transition} from {status}: {reason}")]
pub struct LifecycleViolation {
    pub status: SubmissionStatus,
    pub transition: &'static str,
    pub reason: String,
}

/// Check a transition without applying it.
pub fn check(
    status: SubmissionStatus,
    transition: &Transition,
) -> Result<SubmissionStatus, LifecycleViolation> {
    let violation = |reason: String| LifecycleViolation {
        status,
        transition: transition.name(),
        reason,
    };

    if status != transition.source() {
        return Err(violation(format!("requires status {}", transition.source())));
    }

    match transition {
        Transition::CompleteRoundOne { scored } | Transition::CompleteWithoutVoting { scored } => {
            let missing = missing_judges(&Judge::ALL.into_iter().collect(), scored);
            if !missing.is_empty() {
                return Err(violation(format!("no Round 1 record for {}", missing)));
            }
        }
        Transition::CompleteRoundTwo {
            round_one,
            round_two,
        } => {
            if round_one.is_empty() {
                return Err(violation("no Round 1 records".to_string()));
            }
            let missing = missing_judges(round_one, round_two);
            if !missing.is_empty() {
                return Err(violation(format!("no Round 2 record for {}", missing)));
            }
        }
        Transition::AttachResearch | Transition::OpenVoting => {}
    }

    Ok(transition.target())
}

/// Apply a transition.
///
/// # Panics
///
/// Panics if the precondition does not hold.
pub fn advance(status: SubmissionStatus, transition: &Transition) -> SubmissionStatus {
    match check(status, transition) {
        Ok(next) => next,
        Err(violation) => panic!("lifecycle contract violated: {}", violation),
    }
}

fn missing_judges(required: &BTreeSet<Judge>, present: &BTreeSet<Judge>) -> String {
    required
        .difference(present)
        .map(|j| j.character_id())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> BTreeSet<Judge> {
        Judge::ALL.into_iter().collect()
    }

    #[test]
    fn test_happy_path_with_voting() {
        let mut status = SubmissionStatus::Submitted;
        status = advance(status, &Transition::AttachResearch);
        status = advance(status, &Transition::CompleteRoundOne { scored: all() });
        status = advance(status, &Transition::OpenVoting);
        status = advance(
            status,
            &Transition::CompleteRoundTwo {
                round_one: all(),
                round_two: all(),
            },
        );
        assert_eq!(status, SubmissionStatus::Completed);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_direct_completion() {
        let status = advance(
            SubmissionStatus::Scored,
            &Transition::CompleteWithoutVoting { scored: all() },
        );
        assert_eq!(status, SubmissionStatus::Completed);
    }

    #[test]
    fn test_partial_scoring_does_not_advance() {
        let scored: BTreeSet<Judge> = [Judge::Marc, Judge::Shaw, Judge::Spartan].into();
        let err = check(SubmissionStatus::Researched, &Transition::CompleteRoundOne { scored })
            .unwrap_err();
        assert!(err.reason.contains("peepo"));
    }

    #[test]
    fn test_round_two_needs_every_round_one_judge() {
        let round_one: BTreeSet<Judge> = [Judge::Marc, Judge::Shaw].into();
        let round_two: BTreeSet<Judge> = [Judge::Marc].into();
        let result = check(
            SubmissionStatus::CommunityVoting,
            &Transition::CompleteRoundTwo {
                round_one: round_one.clone(),
                round_two,
            },
        );
        assert!(result.is_err());

        let ok = check(
            SubmissionStatus::CommunityVoting,
            &Transition::CompleteRoundTwo {
                round_one: round_one.clone(),
                round_two: round_one,
            },
        );
        assert_eq!(ok, Ok(SubmissionStatus::Completed));
    }

    #[test]
    fn test_no_backward_or_terminal_moves() {
        assert!(check(SubmissionStatus::Completed, &Transition::OpenVoting).is_err());
        assert!(check(SubmissionStatus::Scored, &Transition::AttachResearch).is_err());
        assert!(check(SubmissionStatus::CommunityVoting, &Transition::OpenVoting).is_err());
    }

    #[test]
    #[should_panic(expected = "lifecycle contract violated")]
    fn test_advance_panics_on_violation() {
        advance(SubmissionStatus::Submitted, &Transition::OpenVoting);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SubmissionStatus::CommunityVoting).unwrap();
        assert_eq!(json, "\"community_voting\"");
    }
}
