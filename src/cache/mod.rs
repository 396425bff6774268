//! Cache subsystem.
//!
//! # Data Flow
//! ```text
//! caller (method_id, identifier_key, value)
//!     → key.rs (canonical namespaced key)
//!     → facade.rs (serialize, count, contain failures)
//!     → store.rs (RemoteStore: SET / EXPIRE / GET / DEL)
//!         → redis_store.rs (shared multiplexed connection, reconnects after drops)
//!         → memory.rs (in-process, for local runs and tests)
//! ```
//!
//! # Design Decisions
//! - No local copy of entries; every read round-trips to the store
//! - Expiry is delegated to the store's native TTL
//! - No retries; the store client owns its own policy

pub mod error;
pub mod facade;
pub mod key;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{CacheError, StoreError};
pub use facade::CacheFacade;
pub use key::{CacheKey, KeyNamespace};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::RemoteStore;

use std::sync::Arc;

use crate::config::CacheConfig;

/// Build the store selected by `config.backend`.
pub fn connect_store(config: &CacheConfig) -> Result<Arc<dyn RemoteStore>, StoreError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        _ => {
            let store = RedisStore::new(&config.redis_url())?;
            tracing::info!(redis_url = %store.url(), "Using Redis cache store");
            Ok(Arc::new(store))
        }
    }
}
