//! Cache Module
//!
//! Two-tier caching: a bounded local tier with TTL expiration and LRU
//! eviction, a shared remote tier, and an access predictor that decides
//! which keys are worth refreshing ahead of demand.

pub mod clock;
mod entry;
pub mod glob;
pub mod key;
mod local;
mod lru;
mod predictor;
mod stats;
mod tiered;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{CacheKey, KeyPart};
pub use local::{EntryInfo, LocalTier};
pub use lru::{AccessMeta, LruTracker};
pub use predictor::AccessPredictor;
pub use stats::{CacheCounters, CacheStats};
pub use tiered::{
    HealthReport, RefreshProvider, Refreshed, SetOutcome, TieredCache, WarmupReport,
};
