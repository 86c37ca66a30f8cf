//! Consolidation and sweep sub-flow.
//!
//! # Data Flow
//! ```text
//! build_transfer → ClientError::ConsolidationRequired
//!     → lifecycle engine raises the consolidation overlay
//!     → (user confirms) sweep.rs::build_consolidation (sweep to the source's own address)
//!     → sweep.rs::send_sweep (one sign_and_send per entry, strictly in order)
//!         → all sent: Vec<SentTransaction>
//!         → entry k fails: PartialSweep { sent: [0..k), failed_index: k, .. }
//! ```
//!
//! # Design Decisions
//! - Entries are never sent concurrently; a later entry may spend outputs
//!   created by an earlier one.
//! - A failed entry stops the sequence. Nothing is retried or rolled back;
//!   a fresh run rebuilds the sweep from the node's current outputs, which
//!   already exclude anything broadcast.
//! - Ordinary sweeps (whole balance to another address) share the same
//!   sender with kind `sweep`.

pub mod sweep;

pub use sweep::{build_consolidation, send_sweep, summarize_consolidation, PartialSweep};
