//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration, dispatch, response sending:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request counters, latency histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every log line through `RequestContext`
//! - Recording a metric with no exporter installed is a no-op

pub mod logging;
pub mod metrics;
