//! Cache Entry Module
//!
//! Defines the structure for individual local-tier entries with TTL support.

use std::time::Duration;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// The payload is opaque bytes; callers pick the serialization format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` after `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `ttl` - Time to live
    /// * `now_ms` - Insertion time (Unix milliseconds)
    pub fn new(value: Vec<u8>, ttl: Duration, now_ms: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl.as_millis() as u64),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero-length TTL is never readable.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, saturating at zero.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Returns the age of the entry in milliseconds.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}
