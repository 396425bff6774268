//! Instrumented I/O boundaries: a namespaced cache facade and query
//! observability hooks, both reporting into an injected metrics sink.

pub mod cache;
pub mod config;
pub mod http;
pub mod observability;
pub mod query;

pub use cache::CacheFacade;
pub use config::ServiceConfig;
pub use observability::MetricsSink;
pub use query::QueryObserver;
