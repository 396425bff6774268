//! In-process store with native TTL.
//!
//! Mirrors the redis semantics the facade relies on: `SET` clears any
//! previous expiry, `EXPIRE` on a missing key is a no-op and expired entries
//! read as absent. Used for local development and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cache::error::StoreError;
use crate::cache::store::RemoteStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every command fails with `Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.value().is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time to live of a key, if it has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check_online()?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        self.check_online()?;
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_online()?;
        let now = Instant::now();
        // Lazily evict on read, the way redis treats expired keys.
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|e| e.value.clone()))
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let store = MemoryStore::new();
        store.set("k", "v".into()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.del("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_expire_zero_evicts() {
        let store = MemoryStore::new();
        store.set("k", "v".into()).await.unwrap();
        store.expire("k", 0).await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_clears_ttl() {
        let store = MemoryStore::new();
        store.set("k", "v1".into()).await.unwrap();
        store.expire("k", 60).await.unwrap();
        assert!(store.ttl("k").is_some());

        store.set("k", "v2".into()).await.unwrap();
        assert!(store.ttl("k").is_none());
    }

    #[tokio::test]
    async fn test_expire_missing_key_is_noop() {
        let store = MemoryStore::new();
        store.expire("missing", 10).await.unwrap();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_fails_every_command() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(store.set("k", "v".into()).await, Err(StoreError::Unavailable(_))));
        assert!(store.get("k").await.is_err());
        assert!(store.expire("k", 1).await.is_err());
        assert!(store.del("k").await.is_err());

        store.set_offline(false);
        assert!(store.get("k").await.unwrap().is_none());
    }
}
