//! Canonical cache key construction.
//!
//! Keys look like `_GQ_{ENV}_{SERVICE}_{METHOD}_{IDENTIFIER}_`, upper-cased as
//! a whole. Components are joined with `_` and are not escaped, so a component
//! that itself contains `_` can collide with a different split of the same
//! characters (`("a_b", "c")` and `("a", "b_c")` map to one key).

use std::fmt;

pub const KEY_PREFIX: &str = "_GQ_";
pub const KEY_DELIMITER: char = '_';

/// A fully namespaced store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(environment: &str, service: &str, method_id: &str, identifier_key: &str) -> Self {
        let d = KEY_DELIMITER;
        let raw = format!("{KEY_PREFIX}{environment}{d}{service}{d}{method_id}{d}{identifier_key}{d}");
        Self(raw.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The fixed (environment, service) half of every key a facade builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNamespace {
    environment: String,
    service: String,
}

impl KeyNamespace {
    pub fn new(environment: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            service: service.into(),
        }
    }

    pub fn key(&self, method_id: &str, identifier_key: &str) -> CacheKey {
        CacheKey::new(&self.environment, &self.service, method_id, identifier_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = CacheKey::new("dev", "orders", "get_user", "42");
        assert_eq!(key.as_str(), "_GQ_DEV_ORDERS_GET_USER_42_");
    }

    #[test]
    fn test_key_is_deterministic() {
        let ns = KeyNamespace::new("prod", "billing");
        assert_eq!(ns.key("m1", "k1"), ns.key("m1", "k1"));
        assert_ne!(ns.key("m1", "k1"), ns.key("m1", "k2"));
    }

    #[test]
    fn test_case_insensitive_inputs_share_key() {
        let ns = KeyNamespace::new("dev", "svc");
        assert_eq!(ns.key("Lookup", "abc"), ns.key("LOOKUP", "ABC"));
    }

    #[test]
    fn test_delimiter_collision_is_not_escaped() {
        let ns = KeyNamespace::new("dev", "svc");
        assert_eq!(ns.key("a_b", "c"), ns.key("a", "b_c"));
    }

    #[test]
    fn test_display_matches_as_str() {
        let key = CacheKey::new("dev", "svc", "m", "k");
        assert_eq!(key.to_string(), key.as_str());
    }
}
