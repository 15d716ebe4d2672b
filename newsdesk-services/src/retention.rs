//! Bounded, ordered retention per partition
//!
//! Each partition keeps a working set governed by one of two policies, and
//! every ingestion batch folds its outcome into the partition's daily
//! statistics. Item commit and stats update are one logical unit: stats
//! only ever reflect items that were actually committed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use newsdesk_core::{Item, PartitionStats};

use crate::scorer::rank;
use crate::store::ItemStore;

/// Retention policy for one partition
#[derive(Debug, Clone)]
pub enum RetentionPolicy {
    /// Keep items inside a trailing publish window, at or above a relevance
    /// floor, ranked, capped at `limit`
    RelevanceWindow {
        window: Duration,
        min_relevance: u8,
        limit: usize,
    },
    /// Keep at most `capacity` items regardless of score, evicting the
    /// oldest-published first. Used for rolling digest partitions.
    FifoBounded { capacity: usize },
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy::RelevanceWindow {
            window: Duration::days(7),
            min_relevance: 40,
            limit: 50,
        }
    }
}

/// Enforces retention policies and maintains partition statistics
pub struct RetentionManager {
    store: Arc<dyn ItemStore>,
    /// Policy overrides per partition; everything else uses the default
    policies: HashMap<String, RetentionPolicy>,
    default_policy: RetentionPolicy,
    /// Retained working set per partition
    retained: RwLock<HashMap<String, Vec<Item>>>,
    /// Region relevance at or above which an item counts as high-relevance
    high_relevance_threshold: u8,
}

impl RetentionManager {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            policies: HashMap::new(),
            default_policy: RetentionPolicy::default(),
            retained: RwLock::new(HashMap::new()),
            high_relevance_threshold: 70,
        }
    }

    pub fn with_default_policy(mut self, policy: RetentionPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Override the policy for one partition
    pub fn with_policy(mut self, partition: impl Into<String>, policy: RetentionPolicy) -> Self {
        self.policies.insert(partition.into(), policy);
        self
    }

    pub fn with_high_relevance_threshold(mut self, threshold: u8) -> Self {
        self.high_relevance_threshold = threshold;
        self
    }

    fn policy_for(&self, partition: &str) -> &RetentionPolicy {
        self.policies.get(partition).unwrap_or(&self.default_policy)
    }

    /// Ingest a scored batch, returning the items actually committed.
    ///
    /// Items whose identity key already exists in the partition's retained
    /// set are rejected; the rest join the working set, the policy runs,
    /// and the surviving newcomers are committed to the store. The daily
    /// stats row is then upserted for the committed items only.
    pub async fn ingest(
        &self,
        partition: &str,
        scored: Vec<Item>,
        provider_calls: u64,
    ) -> Vec<Item> {
        let committed = {
            let mut retained = self.retained.write();
            let working = retained.entry(partition.to_string()).or_default();

            let mut known: HashSet<String> =
                working.iter().map(|i| i.identity_key.clone()).collect();

            let mut accepted_keys: HashSet<String> = HashSet::new();
            for item in scored {
                if known.insert(item.identity_key.clone()) {
                    accepted_keys.insert(item.identity_key.clone());
                    working.push(item);
                } else {
                    debug!("Rejecting duplicate identity key in '{}'", partition);
                }
            }

            self.apply_policy(partition, working);

            working
                .iter()
                .filter(|i| accepted_keys.contains(&i.identity_key))
                .cloned()
                .collect::<Vec<Item>>()
        };

        for item in &committed {
            if let Err(e) = self.store.store(item).await {
                warn!("Failed to persist item '{}': {}", item.title, e);
            }
        }

        self.upsert_batch_stats(partition, &committed, provider_calls)
            .await;

        committed
    }

    fn apply_policy(&self, partition: &str, working: &mut Vec<Item>) {
        match self.policy_for(partition) {
            RetentionPolicy::RelevanceWindow {
                window,
                min_relevance,
                limit,
            } => {
                let cutoff = Utc::now() - *window;
                working.retain(|i| i.published_at >= cutoff && i.region_relevance >= *min_relevance);
                rank(working);
                working.truncate(*limit);
            }
            RetentionPolicy::FifoBounded { capacity } => {
                while working.len() > *capacity {
                    let oldest = working
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, i)| i.published_at)
                        .map(|(idx, _)| idx);
                    match oldest {
                        Some(idx) => {
                            let evicted = working.remove(idx);
                            debug!(
                                "FIFO evicting '{}' (published {})",
                                evicted.title, evicted.published_at
                            );
                        }
                        None => break,
                    }
                }
            }
        }
    }

    async fn upsert_batch_stats(&self, partition: &str, committed: &[Item], provider_calls: u64) {
        if committed.is_empty() && provider_calls == 0 {
            return;
        }

        let mut stats = PartitionStats::new(partition, Utc::now().date_naive());
        stats.total_items = committed.len() as u64;
        stats.high_relevance_items = committed
            .iter()
            .filter(|i| i.region_relevance >= self.high_relevance_threshold)
            .count() as u64;
        stats.distinct_sources = committed
            .iter()
            .map(|i| i.source.as_str())
            .collect::<HashSet<_>>()
            .len() as u64;
        if !committed.is_empty() {
            stats.avg_topical_score = committed
                .iter()
                .map(|i| i.topical_score as f64)
                .sum::<f64>()
                / committed.len() as f64;
        }
        stats.provider_calls = provider_calls;

        if let Err(e) = self.store.upsert_stats(&stats).await {
            warn!("Failed to upsert stats for '{}': {}", partition, e);
        }
    }

    /// Snapshot of a partition's retained set
    pub fn retained(&self, partition: &str) -> Vec<Item> {
        self.retained
            .read()
            .get(partition)
            .cloned()
            .unwrap_or_default()
    }

    /// Explicitly reset a partition's stats rows in the store
    pub async fn reset_stats(&self, partition: &str) {
        if let Err(e) = self.store.reset_stats(partition).await {
            warn!("Failed to reset stats for '{}': {}", partition, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use newsdesk_core::{Category, Provenance, Strategy};
    use std::collections::BTreeSet;

    fn item(url: &str, published_at: DateTime<Utc>, relevance: u8) -> Item {
        Item {
            identity_key: newsdesk_providers::identity_key(url, "Retention test headline"),
            title: "Retention test headline".to_string(),
            description: "A description comfortably past the length floor.".to_string(),
            url: url.to_string(),
            source: "Example".to_string(),
            author: None,
            published_at,
            partition: "de".to_string(),
            category: Category::General,
            topical_score: 60,
            region_relevance: relevance,
            keywords: BTreeSet::new(),
            entities: BTreeSet::new(),
            provenance: Provenance {
                provider: "newswire".to_string(),
                strategy: Strategy::Broad,
            },
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap()
    }

    /// Capacity 3; inserting day1..day4 in order leaves {day2, day3, day4}
    #[tokio::test]
    async fn fifo_evicts_oldest_published_first() {
        let store = Arc::new(MemoryStore::new());
        let manager = RetentionManager::new(store)
            .with_default_policy(RetentionPolicy::FifoBounded { capacity: 3 });

        for d in 1..=4 {
            let committed = manager
                .ingest("de", vec![item(&format!("https://example.com/{d}"), day(d), 50)], 1)
                .await;
            // Every insert commits; eviction happens afterwards
            if d < 4 {
                assert_eq!(committed.len(), 1);
            }
        }

        let retained = manager.retained("de");
        let mut days: Vec<u32> = retained
            .iter()
            .map(|i| i.published_at.format("%d").to_string().parse().unwrap())
            .collect();
        days.sort();
        assert_eq!(days, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn fifo_evicts_by_publish_time_not_insertion_order() {
        let store = Arc::new(MemoryStore::new());
        let manager = RetentionManager::new(store)
            .with_default_policy(RetentionPolicy::FifoBounded { capacity: 2 });

        // Insert the newest first; the oldest-published must still go
        manager.ingest("de", vec![item("https://example.com/new", day(9), 50)], 0).await;
        manager.ingest("de", vec![item("https://example.com/old", day(1), 50)], 0).await;
        manager.ingest("de", vec![item("https://example.com/mid", day(5), 50)], 0).await;

        let retained = manager.retained("de");
        let urls: HashSet<String> = retained.into_iter().map(|i| i.url).collect();
        assert!(urls.contains("https://example.com/new"));
        assert!(urls.contains("https://example.com/mid"));
        assert!(!urls.contains("https://example.com/old"));
    }

    #[tokio::test]
    async fn relevance_window_filters_age_score_and_caps() {
        let store = Arc::new(MemoryStore::new());
        let manager = RetentionManager::new(store).with_default_policy(
            RetentionPolicy::RelevanceWindow {
                window: Duration::days(7),
                min_relevance: 40,
                limit: 2,
            },
        );

        let now = Utc::now();
        let committed = manager
            .ingest(
                "de",
                vec![
                    item("https://example.com/stale", now - Duration::days(10), 90),
                    item("https://example.com/weak", now - Duration::hours(2), 10),
                    item("https://example.com/a", now - Duration::hours(3), 80),
                    item("https://example.com/b", now - Duration::hours(4), 60),
                    item("https://example.com/c", now - Duration::hours(5), 50),
                ],
                3,
            )
            .await;

        // Stale and weak rejected; cap of 2 keeps the two most relevant
        assert_eq!(committed.len(), 2);
        let urls: Vec<&str> = committed.iter().map(|i| i.url.as_str()).collect();
        assert!(urls.contains(&"https://example.com/a"));
        assert!(urls.contains(&"https://example.com/b"));
    }

    #[tokio::test]
    async fn duplicate_identity_keys_are_rejected_across_batches() {
        let store = Arc::new(MemoryStore::new());
        let manager = RetentionManager::new(Arc::clone(&store) as Arc<dyn ItemStore>);

        let now = Utc::now();
        let first = manager
            .ingest("de", vec![item("https://example.com/a", now, 80)], 1)
            .await;
        assert_eq!(first.len(), 1);

        let second = manager
            .ingest(
                "de",
                vec![
                    item("https://example.com/a", now, 80),
                    item("https://example.com/b", now, 80),
                ],
                1,
            )
            .await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].url, "https://example.com/b");

        // No two retained items share an identity key
        let retained = manager.retained("de");
        let keys: HashSet<&str> = retained.iter().map(|i| i.identity_key.as_str()).collect();
        assert_eq!(keys.len(), retained.len());
    }

    #[tokio::test]
    async fn stats_reflect_committed_items_only() {
        let store = Arc::new(MemoryStore::new());
        let manager = RetentionManager::new(Arc::clone(&store) as Arc<dyn ItemStore>)
            .with_high_relevance_threshold(70);

        let now = Utc::now();
        manager
            .ingest(
                "de",
                vec![
                    item("https://example.com/a", now, 90),
                    item("https://example.com/b", now, 50),
                ],
                2,
            )
            .await;
        // Second batch: one duplicate (rejected), nothing else
        manager
            .ingest("de", vec![item("https://example.com/a", now, 90)], 1)
            .await;

        let stats = store.stats_for("de", Utc::now().date_naive()).unwrap();
        assert_eq!(stats.total_items, 2, "Rejected duplicate must not count");
        assert_eq!(stats.high_relevance_items, 1);
        assert_eq!(stats.provider_calls, 3);
    }

    struct FailingStore;

    #[async_trait]
    impl ItemStore for FailingStore {
        async fn store(&self, _item: &Item) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn query_by_partition(
            &self,
            _partition: &str,
            _min_relevance: u8,
            _limit: usize,
        ) -> Result<Vec<Item>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn upsert_stats(&self, _stats: &PartitionStats) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn reset_stats(&self, _partition: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_committed_items() {
        let manager = RetentionManager::new(Arc::new(FailingStore));
        let committed = manager
            .ingest("de", vec![item("https://example.com/a", Utc::now(), 80)], 1)
            .await;
        assert_eq!(committed.len(), 1);
        assert_eq!(manager.retained("de").len(), 1);
    }
}
