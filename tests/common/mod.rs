//! Shared fixtures for integration tests.

use std::sync::Arc;

use io_sentry::cache::{CacheFacade, MemoryStore, RemoteStore};
use io_sentry::config::{CacheConfig, QueryConfig};
use io_sentry::observability::InMemorySink;
use io_sentry::query::QueryObserver;

#[allow(dead_code)]
pub fn cache_config() -> CacheConfig {
    CacheConfig {
        environment: "it".into(),
        service: "orders".into(),
        default_expiry_secs: 60,
        ..Default::default()
    }
}

/// Facade over an in-process store, plus handles to the store and sink.
#[allow(dead_code)]
pub fn memory_facade() -> (CacheFacade, Arc<MemoryStore>, Arc<InMemorySink>) {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(InMemorySink::new());
    let facade = CacheFacade::new(store.clone(), sink.clone(), &cache_config());
    (facade, store, sink)
}

/// Facade over an arbitrary store.
#[allow(dead_code)]
pub fn facade_over(store: Arc<dyn RemoteStore>) -> (CacheFacade, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::new());
    (CacheFacade::new(store, sink.clone(), &cache_config()), sink)
}

#[allow(dead_code)]
pub fn observer(caller_path_filter: Option<&str>) -> (QueryObserver, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::new());
    let config = QueryConfig {
        caller_path_filter: caller_path_filter.map(str::to_string),
    };
    (QueryObserver::new(sink.clone(), &config), sink)
}
