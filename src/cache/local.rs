//! Local Tier Module
//!
//! Bounded in-process table combining HashMap storage with LRU tracking and
//! TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::lru::{AccessMeta, LruTracker};
use crate::cache::CacheEntry;

// == Entry Info ==
/// Read-only view of a stored entry, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub size_bytes: usize,
    pub age_ms: u64,
    pub ttl_remaining_ms: u64,
    pub access_count: u64,
    pub last_access_ms: u64,
}

// == Local Tier ==
/// Bounded key-value table with LRU eviction and lazy TTL expiry.
///
/// `entries` and `lru` always hold exactly the same key set; every mutation
/// updates both before returning. The tier is not internally synchronized;
/// the orchestrator wraps it in a single lock covering both maps.
#[derive(Debug)]
pub struct LocalTier {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Entries dropped to make room
    evictions: u64,
    /// Entries dropped because their TTL elapsed
    expirations: u64,
    clock: Arc<dyn Clock>,
}

impl LocalTier {
    // == Constructor ==
    /// Creates a new LocalTier on the system clock.
    ///
    /// A `max_entries` of zero is raised to one.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a new LocalTier reading time from `clock`.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.max(1),
            evictions: 0,
            expirations: 0,
            clock,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if present and not expired, bumping its recency and
    /// read count. An expired entry is removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now_ms();
        let entry = self.entries.get(key)?;

        if entry.is_expired_at(now) {
            self.entries.remove(key);
            self.lru.remove(key);
            self.expirations += 1;
            return None;
        }

        let value = entry.value.clone();
        self.lru.touch(key, now);
        Some(value)
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry and resetting its TTL.
    ///
    /// Inserting a new key into a full table first evicts the least recently
    /// used key, so the table never exceeds `max_entries`. Returns the evicted
    /// key, if any.
    pub fn set(&mut self, key: &str, value: Vec<u8>, ttl: Duration) -> Option<String> {
        let now = self.clock.now_ms();
        let mut evicted = None;

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            if let Some(oldest) = self.lru.evict_oldest() {
                self.entries.remove(&oldest);
                self.evictions += 1;
                evicted = Some(oldest);
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl, now));
        self.lru.insert(key, now);

        evicted
    }

    // == Remove ==
    /// Removes an entry and its metadata. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Removes every key matching `pred`, returning the removed keys.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pred(key))
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        doomed
    }

    // == Sweep Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let removed = self.remove_where_entry(|entry| entry.is_expired_at(now));
        self.expirations += removed as u64;
        removed
    }

    fn remove_where_entry<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&CacheEntry) -> bool,
    {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| pred(entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    /// Checks whether a live entry exists without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Returns the access metadata for `key`.
    pub fn access_info(&self, key: &str) -> Option<AccessMeta> {
        self.lru.get(key).copied()
    }

    /// Returns a reporting view of the entry stored under `key`.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let now = self.clock.now_ms();
        let entry = self.entries.get(key)?;
        let meta = self.lru.get(key)?;
        Some(EntryInfo {
            size_bytes: entry.value.len(),
            age_ms: entry.age_ms(now),
            ttl_remaining_ms: entry.ttl_remaining_ms(now),
            access_count: meta.access_count,
            last_access_ms: meta.last_access_ms,
        })
    }

    /// Returns all stored keys, including not-yet-swept expired ones.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn expirations(&self) -> u64 {
        self.expirations
    }

    /// True when the entry table and the recency tracker hold the same keys.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.entries.len() == self.lru.len()
            && self.entries.keys().all(|key| self.lru.contains(key))
            && self.entries.len() <= self.max_entries
    }
}
