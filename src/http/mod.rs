//! HTTP surface: the Basic-Auth gated metrics endpoint.
//!
//! # Data Flow
//! ```text
//! scrape request
//!     → TraceLayer (request span)
//!     → auth.rs (Basic Auth on /metrics only)
//!     → server.rs (render Prometheus text / health probe)
//! ```

pub mod auth;
pub mod server;

pub use server::{metrics_router, serve, spawn_upkeep};
