//! In-process remote tier.
//!
//! Stands in for a network store in single-instance deployments and tests.
//! Faults can be injected to exercise degraded operation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::cache::clock::{Clock, SystemClock};
use crate::cache::glob::GlobPattern;

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: u64,
}

pub struct InMemoryRemote {
    data: DashMap<String, StoredValue>,
    clock: Arc<dyn Clock>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
    get_calls: AtomicU64,
    set_calls: AtomicU64,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store that expires values against `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DashMap::new(),
            clock,
            unavailable: AtomicBool::new(false),
            latency: Mutex::new(None),
            get_calls: AtomicU64::new(0),
            set_calls: AtomicU64::new(0),
        }
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delays every call by `latency` before it runs.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of `get` calls received, including failed ones.
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `set_with_ttl` calls received, including failed ones.
    pub fn set_calls(&self) -> u64 {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Checks for a live key without counting a call.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.data.get(key).is_some_and(|v| v.expires_at > now)
    }

    /// Get current item count, including not-yet-purged expired values
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    async fn before_call(&self) -> RemoteResult<()> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable(
                "in-memory remote marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn get(&self, key: &str) -> RemoteResult<Option<Vec<u8>>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;

        let now = self.clock.now_ms();
        let value = self
            .data
            .get(key)
            .filter(|v| v.expires_at > now)
            .map(|v| v.data.clone());
        if value.is_none() {
            self.data.remove_if(key, |_, v| v.expires_at <= now);
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> RemoteResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;

        let expires_at = self
            .clock
            .now_ms()
            .saturating_add(ttl.as_millis() as u64);
        self.data.insert(
            key.to_string(),
            StoredValue {
                data: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> RemoteResult<()> {
        self.before_call().await?;
        self.data.remove(key);
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        self.before_call().await?;
        let glob =
            GlobPattern::new(pattern).map_err(|e| RemoteError::Backend(e.to_string()))?;

        let now = self.clock.now_ms();
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|e| e.value().expires_at > now && glob.is_match(e.key()))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> RemoteResult<()> {
        self.before_call().await
    }
}
