//! Remote Tier Module
//!
//! Boundary to the shared network key-value store behind the local tier.
//!
//! # Implementations
//! - [`InMemoryRemote`]: process-local stand-in with fault injection
//! - [`RedisRemote`]: Redis via a multiplexed connection manager (feature `redis`)

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryRemote;
#[cfg(feature = "redis")]
pub use self::redis::RedisRemote;

// == Remote Error ==
/// Failure talking to the remote tier.
///
/// Never reaches cache callers: the orchestrator logs it and degrades.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store could not be reached
    #[error("Remote tier unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within the deadline
    #[error("Remote tier timed out after {0:?}")]
    Timeout(Duration),

    /// The payload could not be encoded or decoded
    #[error("Remote serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure
    #[error("Remote backend error: {0}")]
    Backend(String),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

// == Remote Store ==
/// Network key-value store shared across processes.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns the value under `key`, or None if absent.
    async fn get(&self, key: &str) -> RemoteResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> RemoteResult<()>;

    /// Removes `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> RemoteResult<()>;

    /// Lists keys matching a glob `pattern`. A prefix scan is `prefix*`.
    async fn scan(&self, pattern: &str) -> RemoteResult<Vec<String>>;

    /// Deletes every key matching `pattern`, returning the deleted keys.
    async fn delete_matching(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        let keys = self.scan(pattern).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(keys)
    }

    /// Checks that the store is reachable.
    async fn ping(&self) -> RemoteResult<()>;
}
