//! External request bridge.
//!
//! # Data Flow
//! ```text
//! session transport (stdio.rs: one JSON object per line)
//!     → listener.rs (mpsc queue, one request at a time)
//!     → handler.rs::RequestBridge::handle
//!         → request.rs::map_request (method + params → Draft, signer resolved)
//!         → lifecycle::TxEngine (headless: build → one approval → send)
//!         → approval.rs::ApprovalPolicy (single review step)
//!     → session.rs::PendingRequest (exactly one respond or disconnect)
//! ```
//!
//! # Design Decisions
//! - Every failure, including panics, closes the session with code -32000
//! - `PendingRequest` is consumed by value, so answering twice does not compile
//! - Consolidation in headless mode is approved once; after it is broadcast the
//!   session is closed and the caller resubmits against the consolidated outputs

pub mod approval;
pub mod handler;
pub mod listener;
pub mod request;
pub mod session;
pub mod stdio;

pub use approval::{Approval, ApprovalPolicy, ApprovalRequest, AutoApprovePolicy};
pub use handler::RequestBridge;
pub use listener::{subscribe, BridgeListener};
pub use request::{map_request, RequestMethod, SessionRequest};
pub use session::{ErrorReason, PendingRequest, SessionTransport, INTERNAL_ERROR_CODE};
pub use stdio::{read_requests, JsonLinesTransport};
