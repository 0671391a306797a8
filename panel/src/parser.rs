//! Extraction of scores and reasoning from a judge's free-text reply.
//!
//! The reply is expected to contain `<STEM>_SCORE: <n>` and
//! `<STEM>_REASON: <text>` for every criterion plus one `OVERALL_COMMENT:`
//! line. Surrounding chatter, markdown emphasis and bullets are tolerated.
//! A criterion whose score cannot be found is set to [`NEUTRAL_SCORE`] and
//! reported in [`ParsedEvaluation::defaulted`].

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{
    Criterion, CriterionScores, EvaluationNotes, PerCriterion, MAX_CRITERION_SCORE, NEUTRAL_SCORE,
};

struct CriterionPatterns {
    score: Regex,
    reason: Regex,
}

fn label_pattern(label: &str, value: &str) -> Regex {
    // Label, optional emphasis/annotation, a colon, optional emphasis, then the value.
    let pattern = format!(r"(?im)\b{label}\b[^:\n]*:[ \t*_]*{value}");
    Regex::new(&pattern).expect("valid label regex")
}

static PATTERNS: LazyLock<PerCriterion<CriterionPatterns>> = LazyLock::new(|| {
    PerCriterion::from_fn(|criterion| CriterionPatterns {
        score: label_pattern(&criterion.score_label(), r"(-?\d+(?:\.\d+)?)"),
        reason: label_pattern(&criterion.reason_label(), r"(.+)$"),
    })
});

static OVERALL_RE: LazyLock<Regex> =
    LazyLock::new(|| label_pattern("OVERALL_COMMENT", r"(.+)$"));

/// Result of parsing one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub scores: CriterionScores,
    pub reasons: PerCriterion<String>,
    pub overall_comment: String,
    /// Criteria that fell back to the neutral score
    pub defaulted: Vec<Criterion>,
}

impl ParsedEvaluation {
    /// Whether every criterion was read from the reply.
    pub fn is_complete(&self) -> bool {
        self.defaulted.is_empty()
    }

    /// Convert into the notes stored on a score record.
    pub fn into_notes(self) -> EvaluationNotes {
        EvaluationNotes {
            reasons: self.reasons,
            overall_comment: self.overall_comment,
            defaulted: self.defaulted,
            error: None,
        }
    }
}

/// Parse a judge reply. Never fails.
pub fn parse_evaluation(reply: &str) -> ParsedEvaluation {
    let mut scores = CriterionScores::neutral();
    let mut defaulted = Vec::new();

    for criterion in Criterion::ALL {
        match capture(&PATTERNS.get(criterion).score, reply).and_then(|raw| parse_score(&raw)) {
            Some(score) => *scores.get_mut(criterion) = score,
            None => defaulted.push(criterion),
        }
    }

    let reasons = PerCriterion::from_fn(|criterion| {
        capture(&PATTERNS.get(criterion).reason, reply).unwrap_or_default()
    });
    let overall_comment = capture(&OVERALL_RE, reply).unwrap_or_default();

    ParsedEvaluation {
        scores,
        reasons,
        overall_comment,
        defaulted,
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
}

/// Strip trailing markdown emphasis and quotes from captured text.
fn clean_text(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['*', '_'])
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Round and clamp a captured number into 0-10.
fn parse_score(raw: &str) -> Option<u8> {
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, f64::from(MAX_CRITERION_SCORE)) as u8)
}

/// Fallback used when nothing usable came back for a criterion.
pub fn neutral_evaluation(error: impl Into<String>) -> EvaluationNotes {
    EvaluationNotes {
        reasons: PerCriterion::default(),
        overall_comment: String::new(),
        defaulted: Criterion::ALL.to_vec(),
        error: Some(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
Alright, here's my take.

INNOVATION_SCORE: 7
INNOVATION_REASON: Fresh spin on agent marketplaces.
TECHNICAL_SCORE: 6
TECHNICAL_REASON: Works, but the indexer is fragile.
MARKET_SCORE: 5
MARKET_REASON: Crowded space.
EXPERIENCE_SCORE: 8
EXPERIENCE_REASON: Onboarding is delightful.
OVERALL_COMMENT: Solid build with a real shot.
";

    #[test]
    fn test_parses_well_formed_reply() {
        let parsed = parse_evaluation(WELL_FORMED);
        assert!(parsed.is_complete());
        assert_eq!(parsed.scores, CriterionScores::clamped(7, 6, 5, 8));
        assert_eq!(parsed.reasons.technical_execution, "Works, but the indexer is fragile.");
        assert_eq!(parsed.overall_comment, "Solid build with a real shot.");
    }

    #[test]
    fn test_tolerates_markdown_and_case() {
        let reply = "\
- **Innovation_Score:** 9/10
- **INNOVATION_REASON**: Never seen it before**
* technical_score : 7.6
MARKET_SCORE (out of 10): 3
EXPERIENCE_SCORE: **4**
**OVERALL_COMMENT:** \"Ship it.\"";
        let parsed = parse_evaluation(reply);
        assert!(parsed.is_complete());
        assert_eq!(parsed.scores, CriterionScores::clamped(9, 8, 3, 4));
        assert_eq!(parsed.reasons.innovation, "Never seen it before");
        assert_eq!(parsed.overall_comment, "Ship it.");
    }

    #[test]
    fn test_missing_label_defaults_to_neutral() {
        let reply = "INNOVATION_SCORE: 2\nTECHNICAL_SCORE: 9\nEXPERIENCE_SCORE: 10";
        let parsed = parse_evaluation(reply);
        assert_eq!(parsed.defaulted, vec![Criterion::MarketPotential]);
        assert_eq!(parsed.scores.market_potential, NEUTRAL_SCORE);
        assert_eq!(parsed.scores.innovation, 2);
        assert_eq!(parsed.reasons.market_potential, "");
        assert_eq!(parsed.overall_comment, "");
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let reply = "INNOVATION_SCORE: 14\nTECHNICAL_SCORE: -2\nMARKET_SCORE: 10\nEXPERIENCE_SCORE: 0";
        let parsed = parse_evaluation(reply);
        assert!(parsed.is_complete());
        assert_eq!(parsed.scores, CriterionScores::clamped(10, 0, 10, 0));
    }

    #[test]
    fn test_label_without_number_is_defaulted() {
        let parsed = parse_evaluation("INNOVATION_SCORE: very high\n");
        assert!(parsed.defaulted.contains(&Criterion::Innovation));
        assert_eq!(parsed.defaulted.len(), 4);
        assert_eq!(parsed.scores, CriterionScores::neutral());
    }

    #[test]
    fn test_neutral_evaluation_flags_everything() {
        let notes = neutral_evaluation("timeout");
        assert_eq!(notes.defaulted.len(), 4);
        assert_eq!(notes.error.as_deref(), Some("timeout"));
    }
}
