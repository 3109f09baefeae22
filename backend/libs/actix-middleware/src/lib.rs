//! # Actix Middleware Library
//!
//! Shared middleware for Yatube Actix services
//!
//! ## Modules
//! - `correlation_id`: request correlation ids (`x-correlation-id`)
//! - `logging`: structured request/response logging
//! - `metrics`: Prometheus HTTP request metrics

pub mod correlation_id;
pub mod logging;
pub mod metrics;

pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use logging::Logging;
pub use metrics::MetricsMiddleware;
