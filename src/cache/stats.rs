//! Cache Statistics Module
//!
//! Process-wide counters for the tiered cache and the snapshot handed to
//! reporting code.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Counters ==
/// Monotonic counters updated by the orchestrator.
///
/// Counters only ever increase; they reset with the process.
#[derive(Debug, Default)]
pub struct CacheCounters {
    local_hits: AtomicU64,
    remote_hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    predicted_accesses: AtomicU64,
    promotions: AtomicU64,
    remote_failures: AtomicU64,
    degraded_writes: AtomicU64,
    invalidations: AtomicU64,
    refreshes: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $field:ident) => {
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_local_hit, local_hits);
    counter!(record_remote_hit, remote_hits);
    counter!(record_miss, misses);
    counter!(record_set, sets);
    counter!(record_delete, deletes);
    counter!(record_predicted_access, predicted_accesses);
    counter!(record_promotion, promotions);
    counter!(record_remote_failure, remote_failures);
    counter!(record_degraded_write, degraded_writes);
    counter!(record_refresh, refreshes);

    /// Adds `count` invalidated keys.
    pub fn record_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads every counter into a snapshot.
    ///
    /// Local-tier figures are left at zero; the orchestrator fills them in.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            local_hits: self.local_hits.load(Ordering::Relaxed),
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            predicted_accesses: self.predicted_accesses.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            degraded_writes: self.degraded_writes.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served by the local tier
    pub local_hits: u64,
    /// Lookups served by the remote tier after a local miss
    pub remote_hits: u64,
    /// Lookups that missed both tiers
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// Lookups on keys the predictor expected to be accessed soon
    pub predicted_accesses: u64,
    /// Remote hits copied into the local tier
    pub promotions: u64,
    /// Remote calls that errored or timed out
    pub remote_failures: u64,
    /// Writes that reached only the local tier
    pub degraded_writes: u64,
    /// Keys removed by pattern invalidation
    pub invalidations: u64,
    /// Values re-fetched by the warmup loop
    pub refreshes: u64,
    /// Local entries evicted by the LRU policy
    pub evictions: u64,
    /// Local entries dropped after their TTL elapsed
    pub expirations: u64,
    /// Current number of local entries
    pub local_entries: usize,
    /// Keys with access history in the predictor
    pub tracked_keys: usize,
}

impl CacheStats {
    /// Total lookups.
    pub fn lookups(&self) -> u64 {
        self.local_hits + self.remote_hits + self.misses
    }

    // == Hit Rate ==
    /// Calculates the combined hit rate over both tiers.
    ///
    /// Returns hits / lookups, or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            (self.local_hits + self.remote_hits) as f64 / total as f64
        }
    }

    /// Share of lookups answered without leaving the process.
    pub fn local_hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.local_hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = CacheCounters::new().snapshot();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.local_hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = CacheCounters::new();
        counters.record_local_hit();
        counters.record_remote_hit();
        counters.record_miss();
        counters.record_miss();

        let stats = counters.snapshot();
        assert_eq!(stats.lookups(), 4);
        assert_eq!(stats.hit_rate(), 0.5);
        assert_eq!(stats.local_hit_rate(), 0.25);
    }

    #[test]
    fn test_record_each_counter() {
        let counters = CacheCounters::new();
        counters.record_set();
        counters.record_delete();
        counters.record_predicted_access();
        counters.record_promotion();
        counters.record_remote_failure();
        counters.record_degraded_write();
        counters.record_refresh();
        counters.record_invalidations(3);

        let stats = counters.snapshot();
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.predicted_accesses, 1);
        assert_eq!(stats.promotions, 1);
        assert_eq!(stats.remote_failures, 1);
        assert_eq!(stats.degraded_writes, 1);
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.invalidations, 3);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(CacheStats::default()).unwrap();
        assert_eq!(json["local_hits"], 0);
        assert_eq!(json["tracked_keys"], 0);
    }
}
