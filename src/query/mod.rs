//! Query observability subsystem.
//!
//! # Data Flow
//! ```text
//! data-access call site
//!     → QueryCall (statement, parameters, caller location)
//!     → instrument.rs (on_start / call / on_success | on_error, drop guard)
//!     → observer.rs (duration histogram, execution + error counters,
//!                    slow-query samples)
//!     → MetricsSink
//! ```
//!
//! # Design Decisions
//! - Hooks are an explicit trait (`QueryInterceptor`), attached by wrapping
//!   the call rather than patching the driver
//! - The underlying call's result and error are returned untouched
//! - No timeouts or retries; those belong to the driver

pub mod context;
pub mod instrument;
pub mod observer;
pub mod operation;

pub use context::{CallerLocation, QueryCall, QueryCallContext};
pub use instrument::{instrument_call, ErrorType};
pub use observer::{QueryInterceptor, QueryObserver, SLOW_QUERY_THRESHOLD};
pub use operation::operation_label;
