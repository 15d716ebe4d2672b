//! Persistence interface consumed by the retention manager
//!
//! The real storage engine is an external collaborator; the pipeline only
//! sees this trait. Failures are caught and logged by callers, never
//! propagated out of an aggregation run.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use thiserror::Error;

use newsdesk_core::{Item, PartitionStats};

use crate::scorer::rank;

/// Errors from the persistence sink
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Opaque persistence sink for items and partition statistics
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist one committed item
    async fn store(&self, item: &Item) -> Result<(), StoreError>;

    /// Items for a partition at or above a relevance floor, ranked,
    /// truncated to `limit`
    async fn query_by_partition(
        &self,
        partition: &str,
        min_relevance: u8,
        limit: usize,
    ) -> Result<Vec<Item>, StoreError>;

    /// Merge a stats delta into the partition/day row (additive upsert)
    async fn upsert_stats(&self, stats: &PartitionStats) -> Result<(), StoreError>;

    /// Explicitly reset a partition's stats rows; the only path by which
    /// `total_items` may decrease
    async fn reset_stats(&self, partition: &str) -> Result<(), StoreError>;
}

/// In-memory store used in tests and embedded runs
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Vec<Item>>>,
    stats: RwLock<HashMap<(String, NaiveDate), PartitionStats>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats row for a partition/day, if any batches committed that day
    pub fn stats_for(&self, partition: &str, day: NaiveDate) -> Option<PartitionStats> {
        self.stats
            .read()
            .get(&(partition.to_string(), day))
            .cloned()
    }

    /// Total stored item count across partitions
    pub fn item_count(&self) -> usize {
        self.items.read().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn store(&self, item: &Item) -> Result<(), StoreError> {
        let mut items = self.items.write();
        let partition_items = items.entry(item.partition.clone()).or_default();
        // Overwrite by identity key rather than appending duplicates
        if let Some(existing) = partition_items
            .iter_mut()
            .find(|i| i.identity_key == item.identity_key)
        {
            *existing = item.clone();
        } else {
            partition_items.push(item.clone());
        }
        Ok(())
    }

    async fn query_by_partition(
        &self,
        partition: &str,
        min_relevance: u8,
        limit: usize,
    ) -> Result<Vec<Item>, StoreError> {
        let items = self.items.read();
        let mut matching: Vec<Item> = items
            .get(partition)
            .map(|v| {
                v.iter()
                    .filter(|i| i.region_relevance >= min_relevance)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rank(&mut matching);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn upsert_stats(&self, delta: &PartitionStats) -> Result<(), StoreError> {
        let mut stats = self.stats.write();
        stats
            .entry((delta.partition.clone(), delta.day))
            .and_modify(|existing| existing.merge(delta))
            .or_insert_with(|| delta.clone());
        Ok(())
    }

    async fn reset_stats(&self, partition: &str) -> Result<(), StoreError> {
        let mut stats = self.stats.write();
        stats.retain(|(p, _), _| p != partition);
        Ok(())
    }
}
