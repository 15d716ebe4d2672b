//! Aggregation orchestrator
//!
//! Runs the fetch strategies for a partition in a fixed order, normalizes
//! and merges their payloads, then hands the batch through dedupe, scoring
//! and retention. Strategies are isolated: one failing provider degrades
//! the run instead of aborting it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use newsdesk_core::{
    AggregationResult, DeskError, DeskResult, Item, KeywordKind, Strategy, StrategyOutcome,
};
use newsdesk_providers::{normalizer_for, ProviderRequest, Volatility, HEADLINE_HUB, NEWSWIRE};

use crate::client::RateLimitedClient;
use crate::dedupe::dedupe;
use crate::retention::RetentionManager;
use crate::scorer::{rank, RelevanceScorer};

/// One strategy/provider pairing in the aggregation plan
#[derive(Debug, Clone)]
pub struct StrategyPlan {
    pub strategy: Strategy,
    pub provider: String,
}

impl StrategyPlan {
    pub fn new(strategy: Strategy, provider: impl Into<String>) -> Self {
        Self {
            strategy,
            provider: provider.into(),
        }
    }
}

/// Orchestrator tuning knobs
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Strategies to run per partition, in order
    pub plan: Vec<StrategyPlan>,
    /// Pause between strategy calls within one partition
    pub inter_call_delay: Duration,
    /// Pause between partitions in a full sweep
    pub inter_partition_delay: Duration,
    /// Page size requested from providers
    pub page_size: usize,
    /// How many entity keywords the entity-targeted query combines
    pub entity_query_width: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            plan: vec![
                StrategyPlan::new(Strategy::Broad, NEWSWIRE),
                StrategyPlan::new(Strategy::EntityTargeted, HEADLINE_HUB),
                StrategyPlan::new(Strategy::RegionTargeted, NEWSWIRE),
            ],
            inter_call_delay: Duration::from_millis(250),
            inter_partition_delay: Duration::from_secs(1),
            page_size: 10,
            entity_query_width: 3,
        }
    }
}

/// Chains fetch, normalize, dedupe, score and retain for partitions
pub struct FetchOrchestrator {
    client: Arc<RateLimitedClient>,
    scorer: RelevanceScorer,
    retention: Arc<RetentionManager>,
    config: OrchestratorConfig,
}

impl FetchOrchestrator {
    pub fn new(
        client: Arc<RateLimitedClient>,
        scorer: RelevanceScorer,
        retention: Arc<RetentionManager>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            scorer,
            retention,
            config,
        }
    }

    fn build_request(&self, plan: &StrategyPlan, partition: &str) -> ProviderRequest {
        match plan.strategy {
            // Latest headlines across the provider's index
            Strategy::Broad => ProviderRequest {
                provider: plan.provider.clone(),
                query: None,
                region: None,
                category: None,
                page_size: self.config.page_size,
                volatility: Volatility::Fast,
            },
            // Search for the partition's heaviest entities
            Strategy::EntityTargeted => {
                let entities: Vec<&str> = self
                    .scorer
                    .table()
                    .ranked_by_weight(partition, KeywordKind::Entity)
                    .into_iter()
                    .take(self.config.entity_query_width)
                    .map(|r| r.keyword.as_str())
                    .collect();
                let query = if entities.is_empty() {
                    None
                } else {
                    Some(entities.join(" OR "))
                };
                ProviderRequest {
                    provider: plan.provider.clone(),
                    query,
                    region: None,
                    category: None,
                    page_size: self.config.page_size,
                    volatility: Volatility::Medium,
                }
            }
            // Region-filtered listing
            Strategy::RegionTargeted => ProviderRequest {
                provider: plan.provider.clone(),
                query: None,
                region: Some(partition.to_string()),
                category: None,
                page_size: self.config.page_size,
                volatility: Volatility::Medium,
            },
        }
    }

    /// Run one strategy end to end: fetch, then normalize
    async fn run_strategy(&self, plan: &StrategyPlan, partition: &str) -> DeskResult<Vec<Item>> {
        let request = self.build_request(plan, partition);
        let payload = self.client.fetch(&request).await?;

        let normalizer = normalizer_for(&plan.provider).ok_or_else(|| {
            DeskError::config(format!("No normalizer for provider '{}'", plan.provider))
        })?;
        Ok(normalizer.normalize(&payload, partition, plan.strategy)?)
    }

    /// Aggregate one partition: run every planned strategy, merge, dedupe,
    /// score, retain, and return the committed items ranked and truncated
    /// to `target_count`.
    #[instrument(skip(self))]
    pub async fn aggregate(&self, partition: &str, target_count: usize) -> AggregationResult {
        let calls_before = self.client.calls_made();
        let mut outcomes: Vec<StrategyOutcome> = Vec::with_capacity(self.config.plan.len());
        let mut merged: Vec<Item> = Vec::new();

        for (idx, plan) in self.config.plan.iter().enumerate() {
            if idx > 0 && !self.config.inter_call_delay.is_zero() {
                tokio::time::sleep(self.config.inter_call_delay).await;
            }

            match self.run_strategy(plan, partition).await {
                Ok(items) => {
                    outcomes.push(StrategyOutcome {
                        strategy: plan.strategy,
                        provider: plan.provider.clone(),
                        items_found: items.len(),
                        error: None,
                    });
                    merged.extend(items);
                }
                Err(e) => {
                    warn!(
                        "Strategy {} against {} failed for '{}': {}",
                        plan.strategy, plan.provider, partition, e
                    );
                    outcomes.push(StrategyOutcome {
                        strategy: plan.strategy,
                        provider: plan.provider.clone(),
                        items_found: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let total_found = merged.len();
        let mut unique = dedupe(merged);
        self.scorer.score_all(&mut unique);

        let provider_calls = self.client.calls_made() - calls_before;
        let mut committed = self
            .retention
            .ingest(partition, unique, provider_calls)
            .await;
        rank(&mut committed);
        committed.truncate(target_count);

        let success = outcomes.iter().any(StrategyOutcome::succeeded);
        info!(
            "Aggregated '{}': {} found, {} committed, {} calls, success={}",
            partition,
            total_found,
            committed.len(),
            provider_calls,
            success
        );

        AggregationResult {
            partition: partition.to_string(),
            items: committed,
            total_found,
            provider_calls,
            success,
            strategies: outcomes,
        }
    }

    /// Sweep several partitions in sequence, pausing between them so one
    /// sweep cannot burst through the provider budget.
    pub async fn aggregate_all(
        &self,
        partitions: &[String],
        target_count: usize,
    ) -> Vec<AggregationResult> {
        let mut results = Vec::with_capacity(partitions.len());
        for (idx, partition) in partitions.iter().enumerate() {
            if idx > 0 && !self.config.inter_partition_delay.is_zero() {
                tokio::time::sleep(self.config.inter_partition_delay).await;
            }
            results.push(self.aggregate(partition, target_count).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TieredCache;
    use crate::rate_limiter::RateLimiter;
    use crate::retention::{RetentionManager, RetentionPolicy};
    use crate::scorer::ScoringConfig;
    use crate::store::MemoryStore;
    use chrono::Duration as ChronoDuration;
    use newsdesk_core::{KeywordTable, KeywordWeight};
    use newsdesk_providers::{FixtureGenerator, ProviderTransport};

    fn scorer() -> RelevanceScorer {
        let mut table = KeywordTable::new();
        table.insert(KeywordWeight::new("de", "germany", KeywordKind::Entity, 6));
        table.insert(KeywordWeight::new("de", "berlin", KeywordKind::Place, 4));
        RelevanceScorer::new(ScoringConfig::default(), table)
    }

    fn orchestrator(generator: FixtureGenerator) -> (FetchOrchestrator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(RateLimitedClient::new(
            Arc::new(generator) as Arc<dyn ProviderTransport>,
            Arc::new(RateLimiter::new(1, "test")),
            Arc::new(TieredCache::default()),
        ));
        let retention = Arc::new(
            RetentionManager::new(Arc::clone(&store) as Arc<dyn crate::store::ItemStore>)
                .with_default_policy(RetentionPolicy::RelevanceWindow {
                    window: ChronoDuration::days(7),
                    min_relevance: 0,
                    limit: 50,
                }),
        );
        let config = OrchestratorConfig {
            inter_call_delay: Duration::ZERO,
            inter_partition_delay: Duration::ZERO,
            page_size: 5,
            ..OrchestratorConfig::default()
        };
        (
            FetchOrchestrator::new(client, scorer(), retention, config),
            store,
        )
    }

    #[tokio::test]
    async fn aggregates_and_commits_ranked_items() {
        let (orchestrator, store) = orchestrator(FixtureGenerator::new());

        let result = orchestrator.aggregate("de", 5).await;

        assert!(result.success);
        assert_eq!(result.strategies.len(), 3);
        assert!(result.strategies.iter().all(StrategyOutcome::succeeded));
        assert!(result.total_found > 0);
        assert!(!result.items.is_empty());
        assert!(result.items.len() <= 5);
        // One provider call per strategy, no cache hits on a cold run
        assert_eq!(result.provider_calls, 3);
        // Committed items were persisted
        assert!(store.item_count() >= result.items.len());
        // Ranked: region relevance never increases down the list
        for pair in result.items.windows(2) {
            assert!(pair[0].region_relevance >= pair[1].region_relevance);
        }
    }

    #[tokio::test]
    async fn one_failing_provider_degrades_instead_of_aborting() {
        let (orchestrator, _store) =
            orchestrator(FixtureGenerator::new().with_failing_provider(HEADLINE_HUB));

        let result = orchestrator.aggregate("de", 10).await;

        assert!(result.success, "Run succeeds while any strategy succeeds");
        assert!(!result.items.is_empty());
        let failed: Vec<&StrategyOutcome> = result
            .strategies
            .iter()
            .filter(|o| !o.succeeded())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].provider, HEADLINE_HUB);
        assert!(failed[0].error.is_some());
    }

    #[tokio::test]
    async fn all_strategies_failing_yields_unsuccessful_empty_result() {
        let (orchestrator, store) = orchestrator(
            FixtureGenerator::new()
                .with_failing_provider(NEWSWIRE)
                .with_failing_provider(HEADLINE_HUB),
        );

        let result = orchestrator.aggregate("de", 10).await;

        assert!(!result.success);
        assert!(result.items.is_empty());
        assert_eq!(result.total_found, 0);
        assert!(result.strategies.iter().all(|o| !o.succeeded()));
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn repeat_run_commits_no_duplicates() {
        let (orchestrator, _store) = orchestrator(FixtureGenerator::new());

        let first = orchestrator.aggregate("de", 50).await;
        assert!(!first.items.is_empty());

        // Same cached payloads, same identity keys: nothing new commits
        let second = orchestrator.aggregate("de", 50).await;
        assert!(second.success);
        assert!(second.items.is_empty());
    }

    #[tokio::test]
    async fn sweep_covers_every_partition() {
        let (orchestrator, _store) = orchestrator(FixtureGenerator::new());

        let partitions = vec!["de".to_string(), "fr".to_string()];
        let results = orchestrator.aggregate_all(&partitions, 5).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].partition, "de");
        assert_eq!(results[1].partition, "fr");
        assert!(results.iter().all(|r| r.success));
    }
}
