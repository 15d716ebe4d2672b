//! Pipeline services for newsdesk
//!
//! This crate provides the stateful layer that turns provider payloads into
//! a bounded, scored, deduplicated working set per partition: rate-limited
//! fetching with tiered caching, relevance scoring, retention policies, and
//! the orchestrator that chains them.

pub mod backoff;
pub mod cache;
pub mod client;
pub mod dedupe;
pub mod orchestrator;
pub mod rate_limiter;
pub mod retention;
pub mod scorer;
pub mod store;

pub use backoff::BackoffPolicy;
pub use cache::{CacheStats, CacheTier, TierStats, TieredCache, TieredCacheConfig};
pub use client::RateLimitedClient;
pub use dedupe::dedupe;
pub use orchestrator::{FetchOrchestrator, OrchestratorConfig, StrategyPlan};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use retention::{RetentionManager, RetentionPolicy};
pub use scorer::{rank, RelevanceScorer, ScoringConfig};
pub use store::{ItemStore, MemoryStore, StoreError};
