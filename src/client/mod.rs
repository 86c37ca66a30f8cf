//! Transaction client facade.
//!
//! # Data Flow
//! ```text
//! lifecycle engine / consolidation
//!     → facade.rs (TransactionClient trait: build*, sign_and_send, fetch_balance)
//!     → node.rs (HTTP implementation with timeouts and failover)
//!         → wallet::signer (TxSigner signs the transaction id)
//! ```
//!
//! # Design Decisions
//! - The node reports "needs consolidation" only as free text. `node.rs`
//!   converts it to `ClientError::ConsolidationRequired` at the boundary;
//!   nothing above this module matches on error strings.
//! - The client is shared (`Arc<dyn TransactionClient>`) and outlives any
//!   single lifecycle run.

pub mod facade;
pub mod node;
pub mod types;

pub use facade::TransactionClient;
pub use node::NodeClient;
pub use types::{
    BuiltTransaction, ClientError, ClientResult, PendingTransaction, SendRequest, SentTransaction,
    SweepBuild, SweepTransaction, TxKind,
};
