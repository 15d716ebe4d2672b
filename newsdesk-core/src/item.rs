//! Canonical content records produced by the aggregation pipeline

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topical category of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Business,
    Politics,
    Science,
    Sports,
    General,
}

impl Category {
    /// Parse a provider-supplied category string, falling back to `General`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "technology" | "tech" => Category::Technology,
            "business" | "finance" | "economy" => Category::Business,
            "politics" | "world" => Category::Politics,
            "science" | "health" => Category::Science,
            "sports" => Category::Sports,
            _ => Category::General,
        }
    }

    /// String representation used in provider query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Politics => "politics",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Query shape a fetch strategy executes against a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Broad topical query across the provider's index
    Broad,
    /// Query targeted at the partition's highest-weight entities
    EntityTargeted,
    /// Query targeted at the partition's region name/code
    RegionTargeted,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Broad => "broad",
            Strategy::EntityTargeted => "entity_targeted",
            Strategy::RegionTargeted => "region_targeted",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which provider/strategy pair produced an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Provider name (e.g., "newswire")
    pub provider: String,
    /// Strategy that issued the request
    pub strategy: Strategy,
}

/// A single normalized content record
///
/// Created by a provider normalizer, scored by the relevance scorer,
/// retained or evicted by the retention manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Deduplication key derived from the normalized URL and title prefix
    pub identity_key: String,
    /// Article title
    pub title: String,
    /// Article summary/description
    pub description: String,
    /// Article URL
    pub url: String,
    /// Display name of the publishing source
    pub source: String,
    /// Author, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publication timestamp; required for ordering and eviction
    pub published_at: DateTime<Utc>,
    /// Partition this item belongs to (country code or topic)
    pub partition: String,
    /// Topical category
    pub category: Category,
    /// Topical relevance, clamped to 0..=100
    pub topical_score: u8,
    /// Region/entity relevance, clamped to 0..=100
    pub region_relevance: u8,
    /// Keywords matched during scoring
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    /// Entities matched during scoring
    #[serde(default)]
    pub entities: BTreeSet<String>,
    /// Provider/strategy that produced this item
    pub provenance: Provenance,
}

/// Outcome of one fetch strategy within an aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutcome {
    /// Strategy that ran
    pub strategy: Strategy,
    /// Provider it ran against
    pub provider: String,
    /// Number of normalized items the strategy contributed
    pub items_found: usize,
    /// Failure description, if the strategy failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one aggregation run for a partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Partition that was aggregated
    pub partition: String,
    /// Committed items, ranked and truncated to the requested count
    pub items: Vec<Item>,
    /// Total normalized items found across strategies, pre-dedupe
    pub total_found: usize,
    /// Provider calls made during this run
    pub provider_calls: u64,
    /// False only when every strategy failed
    pub success: bool,
    /// Per-strategy diagnostics
    pub strategies: Vec<StrategyOutcome>,
}
