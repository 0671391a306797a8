//! Ranking of judged submissions.

use std::collections::BTreeMap;

use panel::{round2, Judge, JudgeScore, Round};
use serde::{Deserialize, Serialize};

use crate::lifecycle::SubmissionStatus;
use crate::store::ShowStore;
use crate::types::Result;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub submission_id: String,
    pub project_name: String,
    /// Round the totals were taken from
    pub round: Round,
    pub judge_totals: BTreeMap<Judge, f64>,
    /// Mean of the judge totals, rounded to 2 decimals
    pub average: f64,
}

/// Build an unranked entry from one round's records; `None` if there are none.
pub fn entry_from_scores(
    submission_id: &str,
    project_name: &str,
    round: Round,
    scores: &[JudgeScore],
) -> Option<LeaderboardEntry> {
    if scores.is_empty() {
        return None;
    }
    let judge_totals: BTreeMap<Judge, f64> =
        scores.iter().map(|s| (s.judge, s.weighted_total)).collect();
    let average = round2(judge_totals.values().sum::<f64>() / judge_totals.len() as f64);

    Some(LeaderboardEntry {
        rank: 0,
        submission_id: submission_id.to_string(),
        project_name: project_name.to_string(),
        round,
        judge_totals,
        average,
    })
}

/// Order by average (highest first), then submission id, and assign ranks.
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then_with(|| a.submission_id.cmp(&b.submission_id))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    entries
}

/// Leaderboard over every submission that has been scored.
///
/// Uses Round 2 totals where they exist and Round 1 totals otherwise.
pub async fn build_leaderboard(store: &dyn ShowStore) -> Result<Vec<LeaderboardEntry>> {
    let mut entries = Vec::new();

    for status in [
        SubmissionStatus::Scored,
        SubmissionStatus::CommunityVoting,
        SubmissionStatus::Completed,
    ] {
        for submission in store.submissions_with_status(status).await? {
            let id = submission.submission_id.as_str();
            let mut round = Round::Two;
            let mut scores = store.scores(id, Round::Two).await?;
            if scores.is_empty() {
                round = Round::One;
                scores = store.scores(id, Round::One).await?;
            }
            if let Some(entry) = entry_from_scores(id, submission.name(), round, &scores) {
                entries.push(entry);
            }
        }
    }

    Ok(rank(entries))
}
