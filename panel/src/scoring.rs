//! Weighted scoring engine.
//!
//! Turns a judge reply (or the absence of one) into a complete score record.
//! Every path produces a record: a failed generation yields the neutral
//! fallback rather than a missing judge.

use chrono::Utc;
use tracing::warn;

use crate::community::{final_score, ReactionTally};
use crate::parser::{neutral_evaluation, parse_evaluation};
use crate::types::{
    CriterionScores, Judge, JudgeScore, Round, ScoreNotes, VerdictNotes,
};
use crate::weights::{weighted_total, WeightVector};

/// Builds score records.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Score a Round 1 reply with the judge's own weights.
    pub fn score_reply(submission_id: &str, judge: Judge, reply: &str) -> JudgeScore {
        Self::score_reply_with_weights(submission_id, judge, reply, &judge.weights())
    }

    /// Score a Round 1 reply with an explicit weight vector.
    pub fn score_reply_with_weights(
        submission_id: &str,
        judge: Judge,
        reply: &str,
        weights: &WeightVector,
    ) -> JudgeScore {
        let parsed = parse_evaluation(reply);
        if !parsed.is_complete() {
            warn!(
                submission_id = %submission_id,
                judge = %judge,
                defaulted = ?parsed.defaulted,
                "Reply missing score labels, defaulted to neutral"
            );
        }

        JudgeScore {
            submission_id: submission_id.to_string(),
            judge,
            round: Round::One,
            weighted_total: weighted_total(&parsed.scores, weights),
            scores: parsed.scores,
            notes: ScoreNotes::Evaluation(parsed.into_notes()),
            created_at: Utc::now(),
        }
    }

    /// Neutral Round 1 record used when generation failed outright.
    pub fn neutral_fallback(submission_id: &str, judge: Judge, error: impl Into<String>) -> JudgeScore {
        let scores = CriterionScores::neutral();
        JudgeScore {
            submission_id: submission_id.to_string(),
            judge,
            round: Round::One,
            weighted_total: weighted_total(&scores, &judge.weights()),
            scores,
            notes: ScoreNotes::Evaluation(neutral_evaluation(error)),
            created_at: Utc::now(),
        }
    }

    /// Round 2 record: the Round 1 total plus the community bonus.
    pub fn verdict(
        round_one: &JudgeScore,
        bonus: f64,
        reactions: ReactionTally,
        verdict: impl Into<String>,
        fallback: bool,
    ) -> JudgeScore {
        JudgeScore {
            submission_id: round_one.submission_id.clone(),
            judge: round_one.judge,
            round: Round::Two,
            scores: round_one.scores,
            weighted_total: final_score(round_one.weighted_total, bonus),
            notes: ScoreNotes::Verdict(VerdictNotes {
                verdict: verdict.into(),
                round_one_total: round_one.weighted_total,
                community_bonus: bonus,
                reactions,
                fallback,
            }),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Criterion;

    #[test]
    fn test_score_reply_with_custom_weights() {
        let reply = "INNOVATION_SCORE: 7\nTECHNICAL_SCORE: 6\nMARKET_SCORE: 5\nEXPERIENCE_SCORE: 8";
        let score = ScoringEngine::score_reply_with_weights(
            "sub-1",
            Judge::Marc,
            reply,
            &WeightVector::new(1.5, 1.0, 1.0, 1.0),
        );
        assert_eq!(score.weighted_total, 29.5);
        assert_eq!(score.round, Round::One);
        assert!(!score.is_fallback());
    }

    #[test]
    fn test_neutral_fallback_is_complete_record() {
        for judge in Judge::ALL {
            let score = ScoringEngine::neutral_fallback("sub-1", judge, "HTTP 500");
            assert_eq!(score.scores, CriterionScores::neutral());
            assert_eq!(
                score.weighted_total,
                weighted_total(&CriterionScores::neutral(), &judge.weights())
            );
            assert!(score.is_fallback());
            match &score.notes {
                ScoreNotes::Evaluation(notes) => {
                    assert_eq!(notes.error.as_deref(), Some("HTTP 500"));
                    assert_eq!(notes.defaulted, Criterion::ALL.to_vec());
                }
                other => panic!("unexpected notes {:?}", other),
            }
        }
    }

    #[test]
    fn test_partial_reply_is_not_a_fallback() {
        let score = ScoringEngine::score_reply("sub-1", Judge::Peepo, "INNOVATION_SCORE: 9");
        assert!(!score.is_fallback());
        assert_eq!(score.scores.innovation, 9);
        assert_eq!(score.scores.user_experience, 5);
    }

    #[test]
    fn test_verdict_adds_unweighted_bonus() {
        let round_one = ScoringEngine::neutral_fallback("sub-1", Judge::Shaw, "boom");
        let verdict = ScoringEngine::verdict(&round_one, 1.0, ReactionTally::default(), "Still meh.", false);
        assert_eq!(verdict.round, Round::Two);
        assert_eq!(verdict.weighted_total, round_one.weighted_total + 1.0);
        assert_eq!(verdict.scores, round_one.scores);
        assert!(!verdict.is_fallback());
    }
}
