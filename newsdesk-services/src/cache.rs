//! Tiered response cache
//!
//! Payloads are cached in three pools distinguished by volatility, each
//! with its own TTL. Expiry is lazy: a key past its TTL is treated as
//! absent on read and removed opportunistically. The cache never triggers
//! fetches itself.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use newsdesk_providers::Volatility;

/// Cache pool selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Minutes; volatile data such as latest headlines
    Fast,
    /// Tens of minutes; search and listing results
    Medium,
    /// Hours; near-static reference data
    Slow,
}

impl CacheTier {
    const ALL: [CacheTier; 3] = [CacheTier::Fast, CacheTier::Medium, CacheTier::Slow];

    /// Tier matching a request's declared volatility
    pub fn for_volatility(volatility: Volatility) -> Self {
        match volatility {
            Volatility::Fast => CacheTier::Fast,
            Volatility::Medium => CacheTier::Medium,
            Volatility::Slow => CacheTier::Slow,
        }
    }

    fn index(self) -> usize {
        match self {
            CacheTier::Fast => 0,
            CacheTier::Medium => 1,
            CacheTier::Slow => 2,
        }
    }
}

/// Per-tier TTLs
#[derive(Debug, Clone)]
pub struct TieredCacheConfig {
    pub fast_ttl: Duration,
    pub medium_ttl: Duration,
    pub slow_ttl: Duration,
}

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            fast_ttl: Duration::from_secs(2 * 60),
            medium_ttl: Duration::from_secs(15 * 60),
            slow_ttl: Duration::from_secs(6 * 60 * 60),
        }
    }
}

impl TieredCacheConfig {
    fn ttl(&self, tier: CacheTier) -> Duration {
        match tier {
            CacheTier::Fast => self.fast_ttl,
            CacheTier::Medium => self.medium_ttl,
            CacheTier::Slow => self.slow_ttl,
        }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Read-through/write-through cache with three volatility tiers
pub struct TieredCache<V> {
    pools: [RwLock<HashMap<String, Entry<V>>>; 3],
    config: TieredCacheConfig,
}

impl<V: Clone> TieredCache<V> {
    pub fn new(config: TieredCacheConfig) -> Self {
        Self {
            pools: [
                RwLock::new(HashMap::new()),
                RwLock::new(HashMap::new()),
                RwLock::new(HashMap::new()),
            ],
            config,
        }
    }

    /// Get a fresh value, treating expired entries as absent
    pub fn get(&self, key: &str, tier: CacheTier) -> Option<V> {
        let ttl = self.config.ttl(tier);
        let pool = &self.pools[tier.index()];

        {
            let read = pool.read();
            match read.get(key) {
                Some(entry) if !entry.is_expired(ttl) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: remove it while holding the write lock, re-checking in
        // case a writer refreshed the key in between.
        let mut write = pool.write();
        if let Some(entry) = write.get(key) {
            if !entry.is_expired(ttl) {
                return Some(entry.value.clone());
            }
            write.remove(key);
            debug!("Cache entry expired: {} ({:?})", key, tier);
        }
        None
    }

    /// Store a value, overwriting any previous entry for the key
    pub fn set(&self, key: impl Into<String>, value: V, tier: CacheTier) {
        let mut write = self.pools[tier.index()].write();
        write.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry in one tier
    pub fn clear(&self, tier: CacheTier) {
        self.pools[tier.index()].write().clear();
    }

    /// Drop every entry in every tier
    pub fn clear_all(&self) {
        for tier in CacheTier::ALL {
            self.clear(tier);
        }
    }

    /// Per-tier entry counts (live vs. lazily-expired-but-unswept)
    pub fn stats(&self) -> CacheStats {
        let tier_stats = CacheTier::ALL.map(|tier| {
            let ttl = self.config.ttl(tier);
            let read = self.pools[tier.index()].read();
            let live = read.values().filter(|e| !e.is_expired(ttl)).count();
            TierStats {
                entries: read.len(),
                live,
            }
        });
        CacheStats {
            fast: tier_stats[0],
            medium: tier_stats[1],
            slow: tier_stats[2],
        }
    }
}

impl<V: Clone> Default for TieredCache<V> {
    fn default() -> Self {
        Self::new(TieredCacheConfig::default())
    }
}

/// Entry counts for one tier
#[derive(Debug, Clone, Copy)]
pub struct TierStats {
    pub entries: usize,
    pub live: usize,
}

/// Entry counts across all tiers
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub fast: TierStats,
    pub medium: TierStats,
    pub slow: TierStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_lived() -> TieredCache<String> {
        TieredCache::new(TieredCacheConfig {
            fast_ttl: Duration::from_millis(30),
            medium_ttl: Duration::from_millis(200),
            slow_ttl: Duration::from_secs(60),
        })
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = short_lived();
        cache.set("k", "v".to_string(), CacheTier::Medium);
        assert_eq!(cache.get("k", CacheTier::Medium).as_deref(), Some("v"));
    }

    #[test]
    fn tiers_are_isolated() {
        let cache = short_lived();
        cache.set("k", "fast".to_string(), CacheTier::Fast);
        assert!(cache.get("k", CacheTier::Medium).is_none());
        assert!(cache.get("k", CacheTier::Slow).is_none());
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let cache = short_lived();
        cache.set("k", "v".to_string(), CacheTier::Fast);
        std::thread::sleep(Duration::from_millis(50));
        assert!(cache.get("k", CacheTier::Fast).is_none());
        // The lazy sweep removed it
        assert_eq!(cache.stats().fast.entries, 0);
    }

    #[test]
    fn slower_tier_outlives_fast_tier() {
        let cache = short_lived();
        cache.set("a", "v".to_string(), CacheTier::Fast);
        cache.set("b", "v".to_string(), CacheTier::Medium);
        std::thread::sleep(Duration::from_millis(50));
        assert!(cache.get("a", CacheTier::Fast).is_none());
        assert!(cache.get("b", CacheTier::Medium).is_some());
    }

    #[test]
    fn overwrite_refreshes_entry() {
        let cache = short_lived();
        cache.set("k", "old".to_string(), CacheTier::Fast);
        std::thread::sleep(Duration::from_millis(20));
        cache.set("k", "new".to_string(), CacheTier::Fast);
        std::thread::sleep(Duration::from_millis(20));
        // 40ms after the first write, but only 20ms after the overwrite
        assert_eq!(cache.get("k", CacheTier::Fast).as_deref(), Some("new"));
    }

    #[test]
    fn clear_affects_only_the_given_tier() {
        let cache = short_lived();
        cache.set("a", "v".to_string(), CacheTier::Fast);
        cache.set("b", "v".to_string(), CacheTier::Slow);
        cache.clear(CacheTier::Fast);
        assert!(cache.get("a", CacheTier::Fast).is_none());
        assert!(cache.get("b", CacheTier::Slow).is_some());

        cache.clear_all();
        assert!(cache.get("b", CacheTier::Slow).is_none());
    }

    #[test]
    fn tier_maps_from_volatility() {
        assert_eq!(CacheTier::for_volatility(Volatility::Fast), CacheTier::Fast);
        assert_eq!(CacheTier::for_volatility(Volatility::Slow), CacheTier::Slow);
    }
}
