//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → logging.rs (tracing subscriber, env-filter)
//!     → metrics.rs (optional Prometheus exporter)
//! request path
//!     → counters recorded by gate/handlers via metrics.rs helpers
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
