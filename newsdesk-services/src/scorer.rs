//! Relevance scoring
//!
//! Computes a topical score and a region/entity relevance score per item
//! from the partition's keyword table, then ranks items with the pipeline's
//! tie-break policy. Scoring is deterministic: same text, same table, same
//! scores.

use std::collections::HashMap;

use tracing::debug;

use newsdesk_core::{Item, KeywordKind, KeywordTable};

use newsdesk_providers::normalize::host_of;

/// Scoring constants
///
/// The numeric bonuses are empirically chosen, so they live here as
/// configuration rather than hard-coded weights.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Starting topical score before keyword bonuses
    pub base_topical: u8,
    /// Added per matching topic keyword
    pub per_keyword_bonus: u8,
    /// Region relevance gained per keyword weight unit
    pub weight_multiplier: u32,
    /// Flat bonus when the source domain matches a regional suffix
    pub domain_bonus: u8,
    /// Region relevance at or above which an item counts as high-relevance
    pub high_relevance_threshold: u8,
    /// Topic words applied to every partition
    pub global_topics: Vec<String>,
    /// Regional domain suffixes per partition (e.g., "de" -> [".de"])
    pub regional_domains: HashMap<String, Vec<String>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_topical: 55,
            per_keyword_bonus: 5,
            weight_multiplier: 5,
            domain_bonus: 20,
            high_relevance_threshold: 70,
            global_topics: [
                "technology",
                "artificial intelligence",
                "semiconductor",
                "startup",
                "economy",
                "energy",
                "climate",
                "regulation",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            regional_domains: HashMap::new(),
        }
    }
}

/// Scores items against a keyword table
pub struct RelevanceScorer {
    config: ScoringConfig,
    table: KeywordTable,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig, table: KeywordTable) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Assign both scores and record matched keywords/entities on the item
    pub fn score(&self, item: &mut Item) {
        let text = format!("{} {}", item.title, item.description).to_lowercase();

        let mut topical = self.config.base_topical as u32;
        for topic in &self.config.global_topics {
            if text.contains(&topic.to_lowercase()) {
                topical += self.config.per_keyword_bonus as u32;
                item.keywords.insert(topic.clone());
            }
        }

        let mut region = 0u32;
        for row in self.table.for_partition(&item.partition) {
            if !text.contains(&row.keyword) {
                continue;
            }
            match row.kind {
                KeywordKind::Topic => {
                    topical += self.config.per_keyword_bonus as u32;
                    item.keywords.insert(row.keyword.clone());
                }
                KeywordKind::Entity => {
                    region += row.weight * self.config.weight_multiplier;
                    item.entities.insert(row.keyword.clone());
                }
                KeywordKind::Place => {
                    region += row.weight * self.config.weight_multiplier;
                    item.keywords.insert(row.keyword.clone());
                }
            }
        }

        if let Some(host) = host_of(&item.url) {
            let suffixes = self.config.regional_domains.get(&item.partition);
            let domain_match = suffixes
                .map(|s| s.iter().any(|suffix| host.ends_with(suffix.as_str())))
                .unwrap_or(false);
            if domain_match {
                region += self.config.domain_bonus as u32;
            }
        }

        item.topical_score = topical.min(100) as u8;
        item.region_relevance = region.min(100) as u8;

        debug!(
            "Scored '{}': topical={}, region={}",
            item.title, item.topical_score, item.region_relevance
        );
    }

    /// Score a batch in place
    pub fn score_all(&self, items: &mut [Item]) {
        for item in items.iter_mut() {
            self.score(item);
        }
    }
}

/// Rank items by the pipeline's tie-break policy: region relevance
/// descending, then topical score descending, then most recent first.
/// Fully tied items keep their arrival order (the sort is stable).
pub fn rank(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.region_relevance
            .cmp(&a.region_relevance)
            .then_with(|| b.topical_score.cmp(&a.topical_score))
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
}
