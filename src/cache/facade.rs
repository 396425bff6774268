//! Instrumented cache facade.
//!
//! # Responsibilities
//! - Namespace keys deterministically (see `key.rs`)
//! - Serialize values as JSON and delegate expiry to the store's TTL
//! - Count reads and hits per backend
//!
//! # Failure Semantics
//! No operation returns an error or panics because of the store or the
//! payload. Failures become `false` / `None` plus a warning log, so a cache
//! outage looks exactly like a miss to the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::cache::error::CacheResult;
use crate::cache::key::{CacheKey, KeyNamespace};
use crate::cache::store::RemoteStore;
use crate::config::CacheConfig;
use crate::observability::metrics::{LabelPair, MetricsSink, CACHE_GET_HITS_TOTAL, CACHE_GET_TOTAL};
use crate::observability::{best_effort, contain};

#[derive(Clone)]
pub struct CacheFacade {
    store: Arc<dyn RemoteStore>,
    metrics: Arc<dyn MetricsSink>,
    namespace: KeyNamespace,
    default_expiry_secs: u64,
}

impl CacheFacade {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        metrics: Arc<dyn MetricsSink>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store,
            metrics,
            namespace: KeyNamespace::new(config.environment.as_str(), config.service.as_str()),
            default_expiry_secs: config.default_expiry_secs,
        }
    }

    pub fn construct_key(&self, method_id: &str, identifier_key: &str) -> CacheKey {
        self.namespace.key(method_id, identifier_key)
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Store `value` under the namespaced key with an expiry.
    ///
    /// A missing or zero `expiry_secs` falls back to the configured default.
    /// Returns `false` on any failure; if `SET` succeeded but `EXPIRE` did
    /// not, the value stays in the store without the new expiry.
    pub async fn set<T>(
        &self,
        method_id: &str,
        identifier_key: &str,
        value: &T,
        expiry_secs: Option<u64>,
    ) -> bool
    where
        T: Serialize + ?Sized,
    {
        let key = self.construct_key(method_id, identifier_key);
        let expiry = match expiry_secs {
            Some(secs) if secs > 0 => secs,
            _ => self.default_expiry_secs,
        };

        match self.try_set(&key, value, expiry).await {
            Ok(()) => {
                tracing::debug!(key = %key, expiry_secs = expiry, "Cache set");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Error setting cache");
                false
            }
        }
    }

    async fn try_set<T>(&self, key: &CacheKey, value: &T, expiry_secs: u64) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = serde_json::to_string(value)?;
        self.store.set(key.as_str(), encoded).await?;
        self.store.expire(key.as_str(), expiry_secs).await?;
        Ok(())
    }

    /// Read and decode the value stored under the namespaced key.
    ///
    /// The get counter is incremented before the store is consulted; the hit
    /// counter only after a non-empty read, so hits never exceed gets.
    pub async fn get<T>(&self, method_id: &str, identifier_key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let key = self.construct_key(method_id, identifier_key);
        let labels = self.backend_labels();

        best_effort("cache.get_total", || {
            self.metrics.increment_counter(CACHE_GET_TOTAL, &labels)
        });

        let raw = contain("cache.get", self.store.get(key.as_str()).await)??;

        best_effort("cache.get_hits_total", || {
            self.metrics.increment_counter(CACHE_GET_HITS_TOTAL, &labels)
        });

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value could not be decoded");
                None
            }
        }
    }

    /// Remove the namespaced key. `true` unless the store call fails.
    pub async fn delete(&self, method_id: &str, identifier_key: &str) -> bool {
        let key = self.construct_key(method_id, identifier_key);
        match self.store.del(key.as_str()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Error deleting cache");
                false
            }
        }
    }

    fn backend_labels(&self) -> [LabelPair; 1] {
        [("backend", self.store.backend().to_string())]
    }
}
