//! Redis-backed remote store.
//!
//! Connects lazily on first use and shares one multiplexed connection across
//! all callers. The connection slot is swapped without a lock: callers clone
//! the current connection, and a command that fails with a connection-level
//! error clears the slot so the next call performs a fresh handshake. Connect
//! and command round-trips are bounded by `timeout`; commands are never
//! retried.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::FromRedisValue;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::error::StoreError;
use crate::cache::store::RemoteStore;

/// Upper bound for a connect handshake or a single command round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RedisStore {
    /// Redis connection (lazily connected, cleared when it drops)
    connection: ArcSwapOption<MultiplexedConnection>,
    client: redis::Client,
    redis_url: String,
    timeout: Duration,
}

impl RedisStore {
    /// Create a store for `redis_url`. No I/O happens until the first command.
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        if redis_url.is_empty() {
            return Err(StoreError::Unavailable("redis_url cannot be empty".to_string()));
        }
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            connection: ArcSwapOption::empty(),
            client,
            redis_url: redis_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.redis_url
    }

    /// Clone the shared connection, connecting first if the slot is empty.
    ///
    /// Concurrent callers that find the slot empty each connect; the last one
    /// to finish is kept.
    async fn get_connection(&self) -> Result<MultiplexedConnection, StoreError> {
        if let Some(conn) = self.connection.load_full() {
            return Ok((*conn).clone());
        }

        let conn = match tokio::time::timeout(
            self.timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, redis_url = %self.redis_url, "Redis connect failed");
                return Err(StoreError::from(e));
            }
            Err(_) => {
                tracing::warn!(redis_url = %self.redis_url, timeout = ?self.timeout, "Redis connect timed out");
                return Err(StoreError::Unavailable("connect timed out".to_string()));
            }
        };

        tracing::debug!(redis_url = %self.redis_url, "Redis connected");
        self.connection.store(Some(Arc::new(conn.clone())));
        Ok(conn)
    }

    /// Run one command on the shared connection.
    async fn query<T: FromRedisValue>(
        &self,
        command: &'static str,
        cmd: redis::Cmd,
    ) -> Result<T, StoreError> {
        let mut conn = self.get_connection().await?;
        let outcome: Result<redis::RedisResult<T>, _> =
            tokio::time::timeout(self.timeout, cmd.query_async(&mut conn)).await;

        let err = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => command_error(command)(e),
            Err(_) => StoreError::Unavailable(format!("{command} timed out")),
        };
        if matches!(err, StoreError::Unavailable(_)) {
            tracing::debug!(command, error = %err, "Dropping Redis connection");
            self.connection.store(None);
        }
        Err(err)
    }
}

fn command_error(command: &'static str) -> impl FnOnce(redis::RedisError) -> StoreError {
    move |e| match StoreError::from(e) {
        StoreError::Command { message, .. } => StoreError::Command { command, message },
        other => other,
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        self.query::<()>("SET", cmd).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("EXPIRE");
        cmd.arg(key).arg(seconds);
        self.query::<i64>("EXPIRE", cmd).await.map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query("GET", cmd).await
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.query::<i64>("DEL", cmd).await.map(|_| ())
    }
}
