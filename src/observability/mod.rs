//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle engine, consolidation, bridge, node client
//!     → logging.rs (tracing events carrying run_id / topic / request id)
//!     → metrics.rs (counters behind the `metrics` facade)
//!
//! Consumers:
//!     → stderr (stdout is the bridge transport in the daemon)
//!     → Prometheus scrape endpoint when enabled
//! ```
//!
//! # Design Decisions
//! - Passwords, private keys and unsigned transaction bytes are never logged
//! - Without an installed recorder the counters are no-ops

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
