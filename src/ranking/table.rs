use thiserror::Error;
use tracing::{debug, warn};

use super::types::{DistributionEntry, RawEntry};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("distribution table has no usable entries")]
    Empty,
}

/// Cumulative score distribution for one province/subject track.
///
/// Entries are kept in ascending score order, so `accumulate` is
/// non-increasing along the slice and the last entry is the top bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionTable {
    entries: Vec<DistributionEntry>,
}

impl DistributionTable {
    /// Build a table from file rows, which are published highest score first.
    pub fn from_raw(raw: Vec<RawEntry>) -> Result<Self, TableError> {
        let mut entries: Vec<DistributionEntry> = raw
            .into_iter()
            .rev()
            .filter_map(|row| match row.score.value() {
                Some(score) => Some(DistributionEntry {
                    label: row.score.to_string(),
                    score,
                    num: row.num,
                    accumulate: row.accumulate,
                }),
                None => {
                    debug!(label = %row.score, "skipping distribution row with unreadable score");
                    None
                }
            })
            .collect();

        if entries.is_empty() {
            return Err(TableError::Empty);
        }

        entries.sort_by(|a, b| a.score.total_cmp(&b.score));

        if entries
            .windows(2)
            .any(|pair| pair[1].accumulate > pair[0].accumulate)
        {
            warn!("cumulative counts are not monotone; lookups may be imprecise");
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[DistributionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn min_score(&self) -> f64 {
        self.entries[0].score
    }

    pub fn max_score(&self) -> f64 {
        self.entries[self.entries.len() - 1].score
    }

    /// Largest tabulated rank, held by the lowest score
    pub fn max_rank(&self) -> u64 {
        self.entries[0].accumulate
    }

    /// Rank of the lowest tabulated score at or above `score`.
    /// Scores above the table map to rank 1.
    pub fn score_to_rank(&self, score: f64) -> u64 {
        let idx = self.entries.partition_point(|e| e.score < score);
        match self.entries.get(idx) {
            Some(entry) => entry.accumulate,
            None => 1,
        }
    }

    /// Lowest tabulated score whose cumulative count is within `rank`.
    /// Ranks better than the top bucket map to the highest score.
    pub fn rank_to_score(&self, rank: u64) -> f64 {
        let idx = self.entries.partition_point(|e| e.accumulate > rank);
        match self.entries.get(idx) {
            Some(entry) => entry.score,
            None => self.max_score(),
        }
    }

    /// Rows with `min <= score <= max`, ascending
    pub fn range(&self, min: f64, max: f64) -> Vec<DistributionEntry> {
        self.entries
            .iter()
            .filter(|e| e.score >= min && e.score <= max)
            .cloned()
            .collect()
    }
}
