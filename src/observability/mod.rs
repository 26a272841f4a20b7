//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every invocation produces:
//!     → logging.rs (structured log events inside an "invocation" span)
//!     → metrics.rs (one counter increment, one latency sample)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - The per-invocation span carries request ID, method and path
//! - Credentials never reach a log line

pub mod logging;
pub mod metrics;
