//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! cache facade / query observer produce:
//!     → best_effort.rs (contain failures of the recording step itself)
//!     → metrics.rs (counters, histograms via an injected MetricsSink)
//!     → logging.rs (structured log events)
//!
//! Consumers:
//!     → Prometheus scrape of the /metrics endpoint
//!     → Log aggregation (stdout, JSON or pretty)
//! ```
//!
//! # Design Decisions
//! - The registry is injected (`Arc<dyn MetricsSink>`), never reached through a global
//! - Recording never alters the outcome of the call being observed
//! - Metric names and label schemas are fixed constants in `metrics.rs`

pub mod best_effort;
pub mod logging;
pub mod metrics;

pub use self::best_effort::{best_effort, contain};
pub use self::metrics::{InMemorySink, MetricsSink, PrometheusSink};
