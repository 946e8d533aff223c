//! # Middleware Stack
//!
//! - [`metrics`]: Prometheus request metrics and domain gauges.
//!
//! Per-request tracing spans come from `tower_http::trace::TraceLayer`,
//! applied in [`crate::app`].

pub mod metrics;
