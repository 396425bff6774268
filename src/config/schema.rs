//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every section has defaults so a minimal (or empty) file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Cache facade settings.
    pub cache: CacheConfig,

    /// Query observer settings.
    pub query: QueryConfig,

    /// Logging and metrics export.
    pub observability: ObservabilityConfig,

    /// Credentials gating the metrics endpoint.
    pub metrics_auth: MetricsAuthConfig,
}

impl ServiceConfig {
    /// Apply environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.metrics_auth.apply_env();
        self
    }
}

/// Remote store and key namespace configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiry applied when a `set` call does not supply one, in seconds.
    pub default_expiry_secs: u64,

    /// Environment tag baked into every key (e.g., "dev", "prod").
    pub environment: String,

    /// Service tag baked into every key.
    pub service: String,

    /// Store host name or address.
    pub endpoint: String,

    /// Store port.
    pub port: u16,

    /// Store implementation: "redis" or "memory".
    pub backend: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expiry_secs: 3600,
            environment: "dev".to_string(),
            service: "io-sentry".to_string(),
            endpoint: "127.0.0.1".to_string(),
            port: 6379,
            backend: "redis".to_string(),
        }
    }
}

impl CacheConfig {
    /// Connection URL for the redis backend.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.endpoint, self.port)
    }
}

/// Query observer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct QueryConfig {
    /// Only caller locations whose file path contains this substring are
    /// reported on slow-query samples. `None` reports any supplied location.
    pub caller_path_filter: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

pub const METRICS_USERNAME_ENV: &str = "METRICS_USERNAME";
pub const METRICS_PASSWORD_ENV: &str = "METRICS_PASSWORD";

/// Basic-Auth credentials for the metrics endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsAuthConfig {
    pub username: String,
    pub password: String,
}

impl Default for MetricsAuthConfig {
    fn default() -> Self {
        Self {
            username: "io-sentry".to_string(),
            password: String::new(),
        }
    }
}

impl MetricsAuthConfig {
    /// Override credentials from `METRICS_USERNAME` / `METRICS_PASSWORD`.
    pub fn apply_env(&mut self) {
        if let Ok(username) = std::env::var(METRICS_USERNAME_ENV) {
            self.username = username;
        }
        if let Ok(password) = std::env::var(METRICS_PASSWORD_ENV) {
            self.password = password;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.cache.default_expiry_secs, 3600);
        assert_eq!(config.cache.backend, "redis");
        assert!(config.query.caller_path_filter.is_none());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.metrics_auth.username, "io-sentry");
    }

    #[test]
    fn test_partial_sections() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [cache]
            environment = "prod"
            port = 6380

            [query]
            caller_path_filter = "helpers/query_helpers"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.environment, "prod");
        assert_eq!(config.cache.port, 6380);
        assert_eq!(config.cache.service, "io-sentry");
        assert_eq!(config.query.caller_path_filter.as_deref(), Some("helpers/query_helpers"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_redis_url() {
        let cache = CacheConfig {
            endpoint: "cache.internal".into(),
            port: 6390,
            ..Default::default()
        };
        assert_eq!(cache.redis_url(), "redis://cache.internal:6390/");
    }
}
