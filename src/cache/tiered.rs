//! Tiered Cache Module
//!
//! The caller-facing cache: a bounded local tier in front of a shared remote
//! tier, with an access predictor driving warmup.
//!
//! # Lookup Order
//! 1. Local tier - in-process, no I/O
//! 2. Remote tier - network round trip bounded by `remote_timeout`
//! 3. Miss
//!
//! Remote hits are promoted into the local tier with the short local TTL,
//! unless a write, delete or invalidation touched the local tier while the
//! remote read was in flight.
//! Remote failures of any kind degrade to local-only behaviour and are never
//! returned to the caller; only malformed keys and zero TTLs are.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::glob::GlobPattern;
use crate::cache::key::{
    hashed_key_pattern, is_hashed, namespace_prefix, validate_namespace, CacheKey,
};
use crate::cache::local::{EntryInfo, LocalTier};
use crate::cache::predictor::AccessPredictor;
use crate::cache::stats::{CacheCounters, CacheStats};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};

// == Set Outcome ==
/// Result of a write from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Written to both tiers
    Stored,
    /// Written to the local tier only; the remote write failed or timed out
    Degraded,
    /// Nothing written because the value could not be serialized
    Skipped,
}

impl SetOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SetOutcome::Degraded)
    }
}

// == Refresh Provider ==
/// A freshly computed value and the TTL to store it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    pub value: Vec<u8>,
    pub ttl: Duration,
}

/// Caller-supplied source of fresh values for keys predicted to be hot.
///
/// Without a provider the warmup loop only reports its predictions.
#[async_trait]
pub trait RefreshProvider: Send + Sync {
    /// Recomputes the value for `key`, or None to leave it alone.
    async fn refresh(&self, key: &CacheKey) -> Option<Refreshed>;
}

// == Warmup Report ==
/// Summary of one warmup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    /// Popular keys examined
    pub examined: usize,
    /// Keys predicted to be accessed within the horizon
    pub predicted: usize,
    /// Predicted keys re-fetched through the refresh provider
    pub refreshed: usize,
}

// == Health Report ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub remote_available: bool,
    pub local_entries: usize,
    pub max_entries: usize,
    pub tracked_keys: usize,
}

// == Tiered Cache ==
/// Orchestrates the local tier, remote tier and access predictor.
///
/// Construct one per process and share it behind an `Arc`. The local tier
/// and the predictor each sit behind their own lock; neither lock is held
/// across a remote call.
pub struct TieredCache {
    local: Mutex<LocalTier>,
    /// Bumped under the local lock by every set, delete and invalidation
    mutation_epoch: AtomicU64,
    predictor: Mutex<AccessPredictor>,
    remote: Arc<dyn RemoteStore>,
    counters: CacheCounters,
    refresh: RwLock<Option<Arc<dyn RefreshProvider>>>,
    local_ttl: Duration,
    remote_timeout: Duration,
    key_hash_threshold: usize,
    prediction_horizon: Duration,
    warmup_batch: usize,
}

impl TieredCache {
    // == Constructor ==
    /// Creates a cache on the system clock.
    pub fn new(config: &Config, remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_clock(config, remote, Arc::new(SystemClock))
    }

    /// Creates a cache whose local tier and predictor read time from `clock`.
    pub fn with_clock(
        config: &Config,
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            local: Mutex::new(LocalTier::with_clock(config.max_entries, clock.clone())),
            mutation_epoch: AtomicU64::new(0),
            predictor: Mutex::new(AccessPredictor::with_clock(
                config.predictor_max_keys,
                clock,
            )),
            remote,
            counters: CacheCounters::new(),
            refresh: RwLock::new(None),
            local_ttl: config.local_ttl(),
            remote_timeout: config.remote_timeout(),
            key_hash_threshold: config.key_hash_threshold,
            prediction_horizon: config.prediction_horizon(),
            warmup_batch: config.warmup_batch,
        }
    }

    /// Installs the provider the warmup loop uses to refresh hot keys.
    pub fn set_refresh_provider(&self, provider: Arc<dyn RefreshProvider>) {
        *self.refresh.write() = Some(provider);
    }

    pub fn clear_refresh_provider(&self) {
        *self.refresh.write() = None;
    }

    /// Runs a remote call under the timeout, absorbing any failure.
    async fn remote_op<T, F>(&self, op: &'static str, key: &str, call: F) -> Option<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        let result = match tokio::time::timeout(self.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.remote_timeout)),
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.counters.record_remote_failure();
                warn!(op = op, key = %key, error = %e, "Remote tier call failed, continuing local-only");
                None
            }
        }
    }

    /// Runs `f` on the locked local tier and advances the mutation epoch.
    fn mutate_local<T>(&self, f: impl FnOnce(&mut LocalTier) -> T) -> T {
        let mut local = self.local.lock();
        let out = f(&mut local);
        self.mutation_epoch.fetch_add(1, Ordering::AcqRel);
        out
    }

    fn physical(&self, key: &CacheKey) -> String {
        key.physical(self.key_hash_threshold)
    }

    // == Get ==
    /// Looks up `namespace:key`, returning None on a miss in both tiers.
    pub async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let key = CacheKey::new(namespace, key)?;
        Ok(self.get_key(&key).await)
    }

    /// Looks up an already-validated key.
    pub async fn get_key(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let physical = self.physical(key);
        let logical = key.logical();

        let predicted = self
            .predictor
            .lock()
            .will_likely_be_accessed(&logical, self.prediction_horizon);
        if predicted {
            self.counters.record_predicted_access();
        }

        let local_hit = self.local.lock().get(&physical);
        if let Some(value) = local_hit {
            self.counters.record_local_hit();
            self.predictor.lock().record_access(&logical);
            debug!(key = %physical, "cache hit (local)");
            return Some(value);
        }

        let epoch = self.mutation_epoch.load(Ordering::Acquire);
        match self
            .remote_op("get", &physical, self.remote.get(&physical))
            .await
        {
            Some(Some(value)) => {
                self.counters.record_remote_hit();
                self.predictor.lock().record_access(&logical);

                // A mutation since the read started may have made this value stale
                let promoted = {
                    let mut local = self.local.lock();
                    (self.mutation_epoch.load(Ordering::Acquire) == epoch)
                        .then(|| local.set(&physical, value.clone(), self.local_ttl))
                };
                match promoted {
                    Some(evicted) => {
                        if let Some(evicted) = evicted {
                            debug!(key = %evicted, "evicted from local tier during promotion");
                        }
                        self.counters.record_promotion();
                        debug!(key = %physical, "cache hit (remote), promoted");
                    }
                    None => debug!(key = %physical, "cache hit (remote), promotion skipped"),
                }
                Some(value)
            }
            _ => {
                self.counters.record_miss();
                debug!(key = %physical, "cache miss");
                None
            }
        }
    }

    /// Looks up a JSON value. Undecodable payloads count as a miss.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<T>> {
        let Some(bytes) = self.get(namespace, key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(namespace = %namespace, key = %key, error = %e, "Cached value failed to decode, treating as miss");
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Writes `value` to both tiers.
    ///
    /// The remote tier keeps it for `ttl`; the local tier for `ttl` or the
    /// configured local TTL, whichever is shorter.
    pub async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<SetOutcome> {
        let key = CacheKey::new(namespace, key)?;
        self.set_key(&key, value, ttl).await
    }

    pub async fn set_key(
        &self,
        key: &CacheKey,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<SetOutcome> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidRequest(
                "TTL must be greater than zero".to_string(),
            ));
        }
        let physical = self.physical(key);

        let evicted =
            self.mutate_local(|local| local.set(&physical, value.clone(), ttl.min(self.local_ttl)));
        if let Some(evicted) = evicted {
            debug!(key = %evicted, "evicted from local tier");
        }
        self.counters.record_set();

        let stored = self
            .remote_op(
                "set",
                &physical,
                self.remote.set_with_ttl(&physical, &value, ttl),
            )
            .await;

        if stored.is_some() {
            debug!(key = %physical, ttl_secs = ttl.as_secs(), "cache set (local+remote)");
            Ok(SetOutcome::Stored)
        } else {
            self.counters.record_degraded_write();
            Ok(SetOutcome::Degraded)
        }
    }

    /// Writes a value serialized as JSON.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<SetOutcome> {
        let key = CacheKey::new(namespace, key)?;
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set_key(&key, bytes, ttl).await,
            Err(e) => {
                warn!(key = %key, error = %e, "Value failed to serialize, not cached");
                Ok(SetOutcome::Skipped)
            }
        }
    }

    // == Delete ==
    /// Removes `namespace:key` from both tiers. Absent keys are not an error.
    pub async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let key = CacheKey::new(namespace, key)?;
        let physical = self.physical(&key);

        // Remote first, so an in-flight promotion can't outlive the delete
        let remote_deleted = self
            .remote_op("delete", &physical, self.remote.delete(&physical))
            .await
            .is_some();

        self.mutate_local(|local| local.remove(&physical));
        self.predictor.lock().forget(&key.logical());
        self.counters.record_delete();

        if remote_deleted {
            debug!(key = %physical, "cache delete (local+remote)");
        }
        Ok(())
    }

    // == Invalidate Pattern ==
    /// Removes every key of `namespace` whose raw key matches the glob `pattern`.
    ///
    /// Hashed keys cannot be matched against the pattern, so every hashed key of
    /// the namespace is dropped from both tiers. Returns the number of distinct
    /// physical keys removed from either tier.
    pub async fn invalidate_pattern(&self, namespace: &str, pattern: &str) -> Result<usize> {
        validate_namespace(namespace)?;
        if pattern.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Pattern cannot be empty".to_string(),
            ));
        }

        let glob = GlobPattern::new(pattern)
            .map_err(|e| CacheError::InvalidRequest(format!("Invalid pattern: {e}")))?;
        let prefix = namespace_prefix(namespace);
        let remote_pattern = format!("{prefix}{pattern}");
        let hashed_pattern = hashed_key_pattern(namespace);

        // Remote first, so an in-flight promotion can't outlive the invalidation
        let mut remote_removed = self
            .remote_op(
                "delete_matching",
                &remote_pattern,
                self.remote.delete_matching(&remote_pattern),
            )
            .await
            .unwrap_or_default();
        let remote_hashed = self
            .remote_op(
                "delete_matching",
                &hashed_pattern,
                self.remote.delete_matching(&hashed_pattern),
            )
            .await
            .unwrap_or_default();
        remote_removed.extend(remote_hashed);

        let local_removed = self.mutate_local(|local| {
            local.remove_where(|physical| {
                physical
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|raw| is_hashed(physical) || glob.is_match(raw))
            })
        });

        self.predictor.lock().forget_where(|logical| {
            logical
                .strip_prefix(prefix.as_str())
                .is_some_and(|raw| glob.is_match(raw))
        });

        let removed: HashSet<&String> = local_removed.iter().chain(remote_removed.iter()).collect();
        let count = removed.len();
        self.counters.record_invalidations(count as u64);

        info!(
            pattern = %remote_pattern,
            local = local_removed.len(),
            remote = remote_removed.len(),
            "Invalidated {} keys",
            count
        );
        Ok(count)
    }

    // == Prediction ==
    /// Predicts whether `namespace:key` will be read within `within`.
    pub fn will_likely_be_accessed(
        &self,
        namespace: &str,
        key: &str,
        within: Duration,
    ) -> Result<bool> {
        let key = CacheKey::new(namespace, key)?;
        Ok(self
            .predictor
            .lock()
            .will_likely_be_accessed(&key.logical(), within))
    }

    /// Most popular keys by recency-weighted access count.
    pub fn popular_keys(&self, limit: usize) -> Vec<CacheKey> {
        self.predictor
            .lock()
            .popular_keys(limit)
            .into_iter()
            .filter_map(|logical| CacheKey::parse_logical(&logical).ok())
            .collect()
    }

    // == Maintenance ==
    /// Drops expired local entries. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        self.local.lock().sweep_expired()
    }

    /// Examines popular keys and refreshes those predicted to be read soon.
    pub async fn run_warmup(&self) -> WarmupReport {
        let candidates: Vec<(String, bool)> = {
            let mut predictor = self.predictor.lock();
            predictor
                .popular_keys(self.warmup_batch)
                .into_iter()
                .map(|logical| {
                    let likely =
                        predictor.will_likely_be_accessed(&logical, self.prediction_horizon);
                    (logical, likely)
                })
                .collect()
        };

        let mut report = WarmupReport {
            examined: candidates.len(),
            ..WarmupReport::default()
        };

        let provider = self.refresh.read().clone();
        for (logical, likely) in candidates {
            if !likely {
                continue;
            }
            report.predicted += 1;

            let key = match CacheKey::parse_logical(&logical) {
                Ok(key) => key,
                Err(e) => {
                    warn!(key = %logical, error = %e, "Skipping unparseable tracked key");
                    continue;
                }
            };

            let Some(provider) = provider.as_ref() else {
                debug!(key = %key, "predicted hot key (no refresh provider)");
                continue;
            };

            if let Some(fresh) = provider.refresh(&key).await {
                match self.set_key(&key, fresh.value, fresh.ttl).await {
                    Ok(_) => {
                        self.counters.record_refresh();
                        report.refreshed += 1;
                    }
                    Err(e) => warn!(key = %key, error = %e, "Refresh provider returned an unusable value"),
                }
            }
        }

        report
    }

    // == Stats ==
    /// Snapshot of all counters plus current table sizes.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.counters.snapshot();
        {
            let local = self.local.lock();
            stats.local_entries = local.len();
            stats.evictions = local.evictions();
            stats.expirations = local.expirations();
        }
        stats.tracked_keys = self.predictor.lock().tracked_keys();
        stats
    }

    /// Pings the remote tier under the timeout.
    pub async fn health(&self) -> HealthReport {
        let remote_available = self
            .remote_op("ping", "-", self.remote.ping())
            .await
            .is_some();
        let (local_entries, max_entries) = {
            let local = self.local.lock();
            (local.len(), local.max_entries())
        };
        HealthReport {
            remote_available,
            local_entries,
            max_entries,
            tracked_keys: self.predictor.lock().tracked_keys(),
        }
    }

    // == Introspection ==
    /// The physical key `namespace:key` resolves to.
    pub fn physical_key(&self, namespace: &str, key: &str) -> Result<String> {
        Ok(self.physical(&CacheKey::new(namespace, key)?))
    }

    /// Local-tier view of `namespace:key`, including a not-yet-swept expired entry.
    pub fn local_entry(&self, namespace: &str, key: &str) -> Result<Option<EntryInfo>> {
        let physical = self.physical_key(namespace, key)?;
        Ok(self.local.lock().entry_info(&physical))
    }

    pub fn local_len(&self) -> usize {
        self.local.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn local_is_consistent(&self) -> bool {
        self.local.lock().is_consistent()
    }
}
