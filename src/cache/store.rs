//! Remote store capability set.
//!
//! The facade only needs four commands. Any concurrency-safe client that
//! offers them can stand in for redis.

use async_trait::async_trait;

use crate::cache::error::StoreError;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Label value used for the `backend` metric label.
    fn backend(&self) -> &'static str;

    /// `SET key value`
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// `EXPIRE key seconds`
    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError>;

    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// `DEL key`
    async fn del(&self, key: &str) -> Result<(), StoreError>;
}
