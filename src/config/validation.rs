//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (expiry > 0, ports valid, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const STORE_BACKENDS: [&str; 2] = ["redis", "memory"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("cache.default_expiry_secs must be greater than zero")]
    ZeroExpiry,

    #[error("cache.port must be non-zero")]
    ZeroPort,

    #[error("unknown cache.backend '{0}' (expected redis or memory)")]
    UnknownBackend(String),

    #[error("unknown observability.log_level '{0}'")]
    UnknownLogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    BadMetricsAddress(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let cache = &config.cache;

    if cache.default_expiry_secs == 0 {
        errors.push(ValidationError::ZeroExpiry);
    }
    if cache.environment.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "cache.environment" });
    }
    if cache.service.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "cache.service" });
    }
    if cache.endpoint.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "cache.endpoint" });
    }
    if cache.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !STORE_BACKENDS.contains(&cache.backend.as_str()) {
        errors.push(ValidationError::UnknownBackend(cache.backend.clone()));
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
