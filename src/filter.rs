use serde::{Deserialize, Serialize};

use crate::domain::AlignmentRecord;

pub const DEFAULT_TOP: usize = 100;

/// Hit quality cut-offs. A row passes when every bound holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterThresholds {
    pub min_identity: f64,
    /// Inclusive upper bound; the default keeps only e-value 0.
    pub max_evalue: f64,
    pub min_length: u64,
    pub min_coverage: f64,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_identity: 90.0,
            max_evalue: 0.0,
            min_length: 10_000,
            min_coverage: 80.0,
        }
    }
}

impl FilterThresholds {
    pub fn passes(&self, record: &AlignmentRecord) -> bool {
        record.percent_identity >= self.min_identity
            && record.evalue >= 0.0
            && record.evalue <= self.max_evalue
            && record.alignment_length >= self.min_length
            && record.query_coverage >= self.min_coverage
    }
}

/// Keeps passing rows, ranks them by bit score (highest first, ties in
/// input order) and truncates to `limit`.
pub fn select_top(
    records: &[AlignmentRecord],
    thresholds: &FilterThresholds,
    limit: usize,
) -> Vec<AlignmentRecord> {
    let mut ranked: Vec<AlignmentRecord> = records
        .iter()
        .filter(|record| thresholds.passes(record))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.bit_score.total_cmp(&a.bit_score));
    ranked.truncate(limit);
    ranked
}

/// Maps a signed `--top` value onto a row limit; zero or negative keeps nothing.
pub fn limit_from_top(top: i64) -> usize {
    usize::try_from(top).unwrap_or(0)
}
