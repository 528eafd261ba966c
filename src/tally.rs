//! Leaderboard aggregation
//!
//! Votes are grouped by submission and summed per voter class. The result
//! is recomputed from the ledger on every call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::VoterType;

/// A single vote as read for tallying
#[derive(Debug, Clone)]
pub struct TallyRow {
    pub submission_id: i64,
    pub submission_title: String,
    pub voter_type: VoterType,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteSummary {
    pub submission_id: i64,
    pub submission_title: String,
    pub total_weight: f64,
    pub judge_weight: f64,
    pub sponsor_weight: f64,
    pub public_weight: f64,
    pub vote_count: u64,
}

impl VoteSummary {
    fn empty(submission_id: i64, submission_title: String) -> Self {
        Self {
            submission_id,
            submission_title,
            total_weight: 0.0,
            judge_weight: 0.0,
            sponsor_weight: 0.0,
            public_weight: 0.0,
            vote_count: 0,
        }
    }

    fn add(&mut self, voter_type: VoterType, weight: f64) {
        self.total_weight += weight;
        match voter_type {
            VoterType::Judge => self.judge_weight += weight,
            VoterType::Sponsor => self.sponsor_weight += weight,
            VoterType::Public => self.public_weight += weight,
        }
        self.vote_count += 1;
    }
}

/// Build the ranked summary, highest total weight first.
///
/// Ties keep a stable order by submission id. Submissions without votes do
/// not appear.
pub fn summarize<I>(rows: I) -> Vec<VoteSummary>
where
    I: IntoIterator<Item = TallyRow>,
{
    let mut by_submission: HashMap<i64, VoteSummary> = HashMap::new();

    for row in rows {
        by_submission
            .entry(row.submission_id)
            .or_insert_with(|| VoteSummary::empty(row.submission_id, row.submission_title))
            .add(row.voter_type, row.weight);
    }

    let mut summaries: Vec<VoteSummary> = by_submission.into_values().collect();
    summaries.sort_by(|a, b| {
        b.total_weight
            .partial_cmp(&a.total_weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.submission_id.cmp(&b.submission_id))
    });
    summaries
}
