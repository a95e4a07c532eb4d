//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the local tier can hold
    pub max_entries: usize,
    /// Upper bound in seconds on how long a value lives in the local tier
    pub local_ttl: u64,
    /// TTL in seconds for HTTP writes that don't name one
    pub default_ttl: u64,
    /// Deadline in milliseconds for each remote-tier call
    pub remote_timeout_ms: u64,
    /// Logical keys longer than this many bytes are hashed
    pub key_hash_threshold: usize,
    /// Maximum number of keys the predictor keeps history for
    pub predictor_max_keys: usize,
    /// Prediction horizon and warmup interval in seconds
    pub prediction_horizon: u64,
    /// Popular keys examined per warmup pass
    pub warmup_batch: usize,
    /// Expired-entry sweep interval in seconds
    pub sweep_interval: u64,
    /// Statistics report interval in seconds
    pub stats_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Redis connection string; unset keeps the remote tier in-process
    pub redis_url: Option<String>,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum local entries (default: 1000)
    /// - `LOCAL_TTL` - Local-tier TTL cap in seconds (default: 60)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `REMOTE_TIMEOUT_MS` - Remote call deadline (default: 250)
    /// - `KEY_HASH_THRESHOLD` - Key length before hashing (default: 200)
    /// - `PREDICTOR_MAX_KEYS` - Predictor key cap (default: 10000)
    /// - `PREDICTION_HORIZON` - Prediction horizon in seconds (default: 300)
    /// - `WARMUP_BATCH` - Keys examined per warmup pass (default: 50)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `STATS_INTERVAL` - Stats report frequency in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REDIS_URL` - Redis connection string (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            local_ttl: env_or("LOCAL_TTL", defaults.local_ttl),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            remote_timeout_ms: env_or("REMOTE_TIMEOUT_MS", defaults.remote_timeout_ms),
            key_hash_threshold: env_or("KEY_HASH_THRESHOLD", defaults.key_hash_threshold),
            predictor_max_keys: env_or("PREDICTOR_MAX_KEYS", defaults.predictor_max_keys),
            prediction_horizon: env_or("PREDICTION_HORIZON", defaults.prediction_horizon),
            warmup_batch: env_or("WARMUP_BATCH", defaults.warmup_batch),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            stats_interval: env_or("STATS_INTERVAL", defaults.stats_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn local_ttl(&self) -> Duration {
        Duration::from_secs(self.local_ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn prediction_horizon(&self) -> Duration {
        Duration::from_secs(self.prediction_horizon)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval.max(1))
    }

    /// The warmup loop runs once per prediction horizon.
    pub fn warmup_interval(&self) -> Duration {
        Duration::from_secs(self.prediction_horizon.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            local_ttl: 60,
            default_ttl: 300,
            remote_timeout_ms: 250,
            key_hash_threshold: 200,
            predictor_max_keys: 10_000,
            prediction_horizon: 300,
            warmup_batch: 50,
            sweep_interval: 60,
            stats_interval: 300,
            server_port: 3000,
            redis_url: None,
        }
    }
}
