//! Request DTOs for the cache HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for `PUT /cache/:namespace/:key`
///
/// # Fields
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds (uses the configured default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }
}

/// Request body for `POST /cache/:namespace/invalidate`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Glob pattern matched against raw keys of the namespace
    pub pattern: String,
}

impl InvalidateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, "hello");
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"value": "hello", "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let req = SetRequest {
            value: "test".to_string(),
            ttl: Some(0),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_invalidate_request() {
        let req: InvalidateRequest = serde_json::from_str(r#"{"pattern": "42*"}"#).unwrap();
        assert_eq!(req.pattern, "42*");
        assert!(req.validate().is_none());

        let empty = InvalidateRequest {
            pattern: String::new(),
        };
        assert!(empty.validate().is_some());
    }
}
