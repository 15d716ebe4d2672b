//! Per-partition aggregate statistics

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for one partition on one calendar day
///
/// One record exists per (partition, day); ingestion batches merge into it
/// additively. `total_items` never decreases except through an explicit
/// store-level reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub partition: String,
    pub day: NaiveDate,
    /// Items committed to retention
    pub total_items: u64,
    /// Committed items at or above the high-relevance threshold
    pub high_relevance_items: u64,
    /// Distinct source names seen among committed items
    pub distinct_sources: u64,
    /// Mean topical score over committed items
    pub avg_topical_score: f64,
    /// Provider calls made while producing the committed items
    pub provider_calls: u64,
}

impl PartitionStats {
    pub fn new(partition: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            partition: partition.into(),
            day,
            total_items: 0,
            high_relevance_items: 0,
            distinct_sources: 0,
            avg_topical_score: 0.0,
            provider_calls: 0,
        }
    }

    /// Merge another batch of stats for the same partition/day into this one.
    ///
    /// Counts are additive; the average is the item-count-weighted mean of
    /// the two averages. `distinct_sources` is merged as a maximum since the
    /// batches may overlap in sources.
    pub fn merge(&mut self, other: &PartitionStats) {
        let combined = self.total_items + other.total_items;
        if combined > 0 {
            self.avg_topical_score = (self.avg_topical_score * self.total_items as f64
                + other.avg_topical_score * other.total_items as f64)
                / combined as f64;
        }
        self.total_items = combined;
        self.high_relevance_items += other.high_relevance_items;
        self.distinct_sources = self.distinct_sources.max(other.distinct_sources);
        self.provider_calls += other.provider_calls;
    }
}
