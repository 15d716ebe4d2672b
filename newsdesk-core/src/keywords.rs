//! Keyword reference data consulted by the relevance scorer

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// What a keyword refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    /// A named entity (company, person, institution)
    Entity,
    /// A place name (city, region, country)
    Place,
    /// A topic word contributing to the topical score
    Topic,
}

/// A weighted keyword attached to a partition
///
/// Unique per (partition, keyword); weight is a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub partition: String,
    pub keyword: String,
    pub kind: KeywordKind,
    pub weight: u32,
}

impl KeywordWeight {
    pub fn new(
        partition: impl Into<String>,
        keyword: impl Into<String>,
        kind: KeywordKind,
        weight: u32,
    ) -> Self {
        Self {
            partition: partition.into(),
            keyword: keyword.into().to_lowercase(),
            kind,
            weight,
        }
    }
}

/// Keyword weights grouped by partition
///
/// Inserting a row for an existing (partition, keyword) pair replaces it.
/// Rows within a partition iterate in keyword order, which keeps scoring
/// deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    rows: HashMap<String, BTreeMap<String, KeywordWeight>>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyword row, replacing any existing row for the same
    /// (partition, keyword) pair.
    pub fn insert(&mut self, row: KeywordWeight) {
        self.rows
            .entry(row.partition.clone())
            .or_default()
            .insert(row.keyword.clone(), row);
    }

    /// Rows for a partition, in keyword order
    pub fn for_partition(&self, partition: &str) -> impl Iterator<Item = &KeywordWeight> {
        self.rows.get(partition).into_iter().flat_map(|m| m.values())
    }

    /// Rows of a given kind for a partition, heaviest first
    pub fn ranked_by_weight(&self, partition: &str, kind: KeywordKind) -> Vec<&KeywordWeight> {
        let mut rows: Vec<&KeywordWeight> = self
            .for_partition(partition)
            .filter(|r| r.kind == kind)
            .collect();
        rows.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.keyword.cmp(&b.keyword)));
        rows
    }

    /// Number of rows across all partitions
    pub fn len(&self) -> usize {
        self.rows.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
