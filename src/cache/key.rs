//! Cache Key Module
//!
//! Validated `(namespace, key)` identities and their physical key form.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

/// Separator between namespace and key.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Marker placed after the namespace separator in hashed physical keys.
pub const HASHED_KEY_MARKER: char = '#';

/// Characters a namespace may not contain.
///
/// Keeping the separator and glob metacharacters out of namespaces means the
/// pattern `namespace:*` selects exactly that namespace.
const RESERVED_NAMESPACE_CHARS: &[char] = &[NAMESPACE_SEPARATOR, '*', '?', '[', ']', '\\'];

// == Key Part ==
/// A primitive value that can take part in a composite key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => f.write_str(s),
            KeyPart::Int(n) => write!(f, "{n}"),
            KeyPart::UInt(n) => write!(f, "{n}"),
            KeyPart::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::UInt(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::UInt(u64::from(value))
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

// == Cache Key ==
/// Logical cache identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    key: String,
}

impl CacheKey {
    /// Builds a key, rejecting empty parts and reserved namespace characters.
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let key = key.into();

        validate_namespace(&namespace)?;
        if key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }

        Ok(Self { namespace, key })
    }

    /// Builds a key from primitive parts joined by `:`.
    ///
    /// `from_parts("orders", &[42u64.into(), "eu".into()])` is the key `42:eu`.
    pub fn from_parts(namespace: impl Into<String>, parts: &[KeyPart]) -> Result<Self> {
        let key = parts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(":");
        Self::new(namespace, key)
    }

    /// Recovers a key from its logical form `namespace:key`.
    pub fn parse_logical(logical: &str) -> Result<Self> {
        let (namespace, key) = logical.split_once(NAMESPACE_SEPARATOR).ok_or_else(|| {
            CacheError::InvalidKey(format!("Missing namespace separator in '{logical}'"))
        })?;
        Self::new(namespace, key)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The unhashed `namespace:key` form.
    pub fn logical(&self) -> String {
        format!("{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.key)
    }

    /// The key used in both tiers.
    ///
    /// Logical forms longer than `hash_threshold` bytes become
    /// `namespace:#<sha256 hex>`, which stays inside the namespace prefix.
    pub fn physical(&self, hash_threshold: usize) -> String {
        let logical = self.logical();
        if logical.len() <= hash_threshold {
            return logical;
        }

        let digest = Sha256::digest(self.key.as_bytes());
        format!(
            "{}{}{}{}",
            self.namespace,
            NAMESPACE_SEPARATOR,
            HASHED_KEY_MARKER,
            hex::encode(digest)
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.key)
    }
}

/// Rejects empty namespaces and namespaces with reserved characters.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(CacheError::InvalidKey(
            "Namespace cannot be empty".to_string(),
        ));
    }
    if let Some(c) = namespace.chars().find(|c| RESERVED_NAMESPACE_CHARS.contains(c)) {
        return Err(CacheError::InvalidKey(format!(
            "Namespace '{namespace}' contains reserved character '{c}'"
        )));
    }
    Ok(())
}

/// Physical-key prefix shared by every key of `namespace`.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}")
}

/// Hex characters in a hashed key's digest.
const DIGEST_HEX_LEN: usize = 64;

/// Returns true if `physical` is a hashed key.
pub fn is_hashed(physical: &str) -> bool {
    physical
        .split_once(NAMESPACE_SEPARATOR)
        .is_some_and(|(_, rest)| {
            rest.len() == DIGEST_HEX_LEN + 1
                && rest.starts_with(HASHED_KEY_MARKER)
                && rest[1..].bytes().all(|b| b.is_ascii_hexdigit())
        })
}

/// Glob matching every hashed key of `namespace` and nothing else.
pub fn hashed_key_pattern(namespace: &str) -> String {
    format!(
        "{}{HASHED_KEY_MARKER}{}",
        namespace_prefix(namespace),
        "[0-9a-f]".repeat(DIGEST_HEX_LEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_key_passes_through() {
        let key = CacheKey::new("orders", "42").unwrap();
        assert_eq!(key.logical(), "orders:42");
        assert_eq!(key.physical(200), "orders:42");
        assert!(!is_hashed(&key.physical(200)));
    }

    #[test]
    fn test_long_key_is_hashed_deterministically() {
        let raw = "q".repeat(300);
        let a = CacheKey::new("reports", raw.clone()).unwrap();
        let b = CacheKey::new("reports", raw).unwrap();

        let physical = a.physical(200);
        assert_eq!(physical, b.physical(200));
        assert!(physical.starts_with("reports:#"));
        assert_eq!(physical.len(), "reports:#".len() + 64);
        assert!(is_hashed(&physical));
    }

    #[test]
    fn test_threshold_boundary() {
        let key = CacheKey::new("ns", "abcd").unwrap();
        // "ns:abcd" is 7 bytes
        assert_eq!(key.physical(7), "ns:abcd");
        assert!(is_hashed(&key.physical(6)));
    }

    #[test]
    fn test_distinct_long_keys_hash_differently() {
        let a = CacheKey::new("ns", "a".repeat(300)).unwrap();
        let b = CacheKey::new("ns", "b".repeat(300)).unwrap();
        assert_ne!(a.physical(10), b.physical(10));
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!(matches!(
            CacheKey::new("", "k"),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            CacheKey::new("ns", ""),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            CacheKey::new("a:b", "k"),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(matches!(
            CacheKey::new("ord*", "k"),
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_key_may_contain_separator() {
        let key = CacheKey::new("ns", "a:b").unwrap();
        assert_eq!(key.logical(), "ns:a:b");
        assert_eq!(CacheKey::parse_logical("ns:a:b").unwrap(), key);
    }

    #[test]
    fn test_from_parts() {
        let key =
            CacheKey::from_parts("orders", &[42u64.into(), "eu".into(), true.into(), (-1).into()])
                .unwrap();
        assert_eq!(key.key(), "42:eu:true:-1");
        assert_eq!(key.to_string(), "orders:42:eu:true:-1");
    }

    #[test]
    fn test_from_parts_empty_is_rejected() {
        assert!(CacheKey::from_parts("orders", &[]).is_err());
    }

    #[test]
    fn test_namespace_prefix() {
        assert_eq!(namespace_prefix("users"), "users:");
    }

    #[test]
    fn test_hashed_key_pattern_matches_only_hashed_keys() {
        use crate::cache::glob::GlobPattern;

        let glob = GlobPattern::new(&hashed_key_pattern("reports")).unwrap();
        let long = CacheKey::new("reports", "x".repeat(300)).unwrap();
        assert!(glob.is_match(&long.physical(200)));

        assert!(!glob.is_match("reports:short"));
        assert!(!glob.is_match("reports:#abc"));
        let other = CacheKey::new("orders", "x".repeat(300)).unwrap();
        assert!(!glob.is_match(&other.physical(200)));
    }
}
