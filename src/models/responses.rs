//! Response DTOs for the cache HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, HealthReport};

/// Response body for `GET /cache/:namespace/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub namespace: String,
    pub key: String,
    /// The stored value, decoded as UTF-8 (lossy)
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(namespace: impl Into<String>, key: impl Into<String>, value: &[u8]) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}

/// Response body for `PUT /cache/:namespace/:key`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub key: String,
    /// True when only the local tier accepted the write
    pub degraded: bool,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, degraded: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            degraded,
        }
    }
}

/// Response body for `DELETE /cache/:namespace/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for `POST /cache/:namespace/invalidate`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub namespace: String,
    pub pattern: String,
    /// Distinct keys removed across both tiers
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate over both tiers
    pub hit_rate: f64,
    /// Share of lookups served by the local tier
    pub local_hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            local_hit_rate: stats.local_hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the remote tier is unreachable
    pub status: String,
    #[serde(flatten)]
    pub report: HealthReport,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        let status = if report.remote_available {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            report,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("orders", "42", b"test_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("orders"));
        assert!(json.contains("test_value"));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key", true);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["message"].as_str().unwrap().contains("successfully"));
        assert_eq!(json["degraded"], true);
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            local_hits: 60,
            remote_hits: 20,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert!((resp.local_hit_rate - 0.6).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["local_hits"], 60);
    }

    #[test]
    fn test_health_response_status() {
        let report = HealthReport {
            remote_available: false,
            local_entries: 0,
            max_entries: 10,
            tracked_keys: 0,
        };
        let resp = HealthResponse::from(report);
        assert_eq!(resp.status, "degraded");

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("timestamp"));
        assert!(json.contains("remote_available"));
    }
}
