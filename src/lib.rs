//! Wallet transaction lifecycle library.
//!
//! Drives value transfers, contract deployments and contract calls from a
//! draft to a signed and submitted transaction, inserting a UTXO
//! consolidation sweep when the node asks for one, and serves the same
//! lifecycle to external applications through a session request bridge.

pub mod amount;
pub mod bridge;
pub mod client;
pub mod config;
pub mod consolidation;
pub mod draft;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod runtime;
pub mod wallet;

pub use config::WalletConfig;
pub use error::{Result, TxError};
pub use lifecycle::TxEngine;
pub use runtime::Shutdown;
