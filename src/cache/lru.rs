//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for bounded tables.
//!
//! Used by the local tier for entry eviction and by the access predictor to cap
//! the number of keys it keeps history for.

use std::collections::{BTreeMap, HashMap};

// == Access Metadata ==
/// Per-key access metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessMeta {
    /// Last time the key was read or written (Unix milliseconds)
    pub last_access_ms: u64,
    /// Number of successful reads since the key was inserted
    pub access_count: u64,
    /// Position in the recency order
    tick: u64,
}

// == LRU Tracker ==
/// Tracks access recency for LRU eviction.
///
/// Every read or write hands the key a fresh tick; the lowest tick in `order`
/// is the least recently used key. Accesses within the same millisecond
/// therefore resolve in access order, and a wall clock stepping backwards
/// cannot reorder keys.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Metadata by key
    meta: HashMap<String, AccessMeta>,
    /// Recency index, oldest first
    order: BTreeMap<u64, String>,
    /// Next tick to hand out
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self, key: &str, now_ms: u64, count_read: bool) {
        let tick = self.next_tick;
        self.next_tick += 1;

        let meta = match self.meta.get_mut(key) {
            Some(meta) => {
                self.order.remove(&meta.tick);
                meta.last_access_ms = now_ms;
                meta.tick = tick;
                if count_read {
                    meta.access_count += 1;
                }
                *meta
            }
            None => {
                let meta = AccessMeta {
                    last_access_ms: now_ms,
                    access_count: u64::from(count_read),
                    tick,
                };
                self.meta.insert(key.to_string(), meta);
                meta
            }
        };
        self.order.insert(meta.tick, key.to_string());
    }

    // == Touch ==
    /// Records a read: marks the key as most recently used and bumps its count.
    ///
    /// Unknown keys start tracking with a count of one.
    pub fn touch(&mut self, key: &str, now_ms: u64) {
        self.bump(key, now_ms, true);
    }

    // == Insert ==
    /// Records a write: marks the key as most recently used.
    ///
    /// The read count of an existing key is preserved across overwrites.
    pub fn insert(&mut self, key: &str, now_ms: u64) {
        self.bump(key, now_ms, false);
    }

    // == Remove ==
    /// Stops tracking a key, returning its metadata if it was tracked.
    pub fn remove(&mut self, key: &str) -> Option<AccessMeta> {
        let meta = self.meta.remove(key)?;
        self.order.remove(&meta.tick);
        Some(meta)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.meta.remove(&key);
        Some(key)
    }

    /// Returns the metadata tracked for `key`.
    pub fn get(&self, key: &str) -> Option<&AccessMeta> {
        self.meta.get(key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.meta.contains_key(key)
    }
}
