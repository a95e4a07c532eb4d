//! Redis remote tier.
//!
//! Values are stored as plain Redis strings with `SET EX`; pattern scans use
//! cursor-based `SCAN MATCH` so large keyspaces are never walked with `KEYS`.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tracing::debug;

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::cache::glob;

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

impl From<RedisError> for RemoteError {
    fn from(e: RedisError) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout(Duration::ZERO)
        } else if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() {
            RemoteError::Unavailable(e.to_string())
        } else {
            RemoteError::Backend(e.to_string())
        }
    }
}

pub struct RedisRemote {
    connection: ConnectionManager,
    /// Optional key prefix for sharing a Redis instance (e.g. "myapp:")
    prefix: String,
}

impl RedisRemote {
    /// Connects without a key prefix.
    pub async fn connect(connection_string: &str) -> RemoteResult<Self> {
        Self::connect_with_prefix(connection_string, None).await
    }

    /// Connects, prepending `prefix` to every key.
    pub async fn connect_with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> RemoteResult<Self> {
        let client = Client::open(connection_string)
            .map_err(|e| RemoteError::Backend(format!("invalid Redis URL: {e}")))?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    #[inline]
    fn strip_prefix(&self, key: String) -> String {
        if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.prefix)
                .map(str::to_string)
                .unwrap_or(key)
        }
    }
}

/// Redis expiries are whole seconds; round up so nothing outlives its TTL by less.
fn ttl_seconds(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).div_ceil(1000).max(1)
}

#[async_trait]
impl RemoteStore for RedisRemote {
    async fn get(&self, key: &str) -> RemoteResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(self.prefixed_key(key)).await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> RemoteResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(self.prefixed_key(key), value, ttl_seconds(ttl))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> RemoteResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.prefixed_key(key)).await?;
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let full_pattern = format!("{}{}", glob::escape(&self.prefix), pattern);

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&full_pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch.into_iter().map(|k| self.strip_prefix(k)));
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        debug!(pattern = %full_pattern, found = keys.len(), "Redis SCAN complete");
        Ok(keys)
    }

    async fn delete_matching(&self, pattern: &str) -> RemoteResult<Vec<String>> {
        let keys = self.scan(pattern).await?;
        if keys.is_empty() {
            return Ok(keys);
        }

        let mut conn = self.connection.clone();
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed_key(k)).collect();
        for chunk in prefixed.chunks(SCAN_BATCH) {
            conn.del::<_, ()>(chunk).await?;
        }
        Ok(keys)
    }

    async fn ping(&self) -> RemoteResult<()> {
        let mut conn = self.connection.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_secs(300)), 300);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(1)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }

    #[test]
    fn test_redis_error_classification() {
        let io = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(RemoteError::from(io), RemoteError::Unavailable(_)));
    }
}
