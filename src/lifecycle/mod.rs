//! Transaction lifecycle engine.
//!
//! # Data Flow
//! ```text
//! Draft ──→ engine.rs::build
//!             → dispatch.rs (per-kind validate + build, keyed by DraftKind)
//!             → ConsolidationRequired? ──→ overlay ──confirm──→ consolidation::build_consolidation
//!             → check.rs (CheckSummary: amount after fees, fee, destination)
//!         AwaitingConfirmation ──confirm──→ [AwaitingPassword ──unlock──→] Sending
//!             → Single: TransactionClient::sign_and_send
//!             → Sweep:  consolidation::send_sweep (sequential)
//!         Sent ──→ AddressBook::refresh_balance
//! ```
//!
//! # Design Decisions
//! - `LifecycleState` is an immutable value; every transition consumes it and
//!   returns the next state or `TxError::InvalidTransition`.
//! - The consolidation flag is sticky for the lifetime of an engine: once
//!   set, every build produces the sweep-to-self shape.
//! - An in-flight guard rejects overlapping build/send calls with `Busy`
//!   instead of queueing them.
//! - Build and send failures move to `Failed` and are also returned to the
//!   caller; a wrong password is not a failure.

pub mod check;
pub mod dispatch;
pub mod engine;
pub mod guard;
pub mod state;

pub use check::{CheckSummary, Purpose};
pub use dispatch::{handler_for, KindHandler};
pub use engine::TxEngine;
pub use guard::{InFlight, InFlightGuard};
pub use state::{BuildResult, LifecycleState, SendOutcome, Stage};
