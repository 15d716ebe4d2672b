//! Core types for the newsdesk aggregation pipeline
//!
//! This crate defines the shared data structures used across the pipeline,
//! including the canonical item record, keyword reference data, partition
//! statistics, and the error taxonomy.

pub mod error;
pub mod item;
pub mod keywords;
pub mod stats;

pub use error::{DeskError, DeskResult};
pub use item::{AggregationResult, Category, Item, Provenance, Strategy, StrategyOutcome};
pub use keywords::{KeywordKind, KeywordTable, KeywordWeight};
pub use stats::PartitionStats;
