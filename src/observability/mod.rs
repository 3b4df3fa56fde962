//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Normalizer and HTTP layers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (normalization counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
