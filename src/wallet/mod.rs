//! Local wallet state consumed by the lifecycle engine.
//!
//! # Data Flow
//! ```text
//! config [[wallet.addresses]] ──→ addresses.rs (AddressBook, balances refreshed after sends)
//! TXFLOW_SIGNER_KEYS env      ──→ signer.rs    (KeyringSigner, used by the node client)
//! wallet.password_hash        ──→ unlock.rs    (PasswordGate for the AwaitingPassword step)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or passwords

pub mod addresses;
pub mod signer;
pub mod unlock;

pub use addresses::AddressBook;
pub use signer::{KeyringSigner, TxSigner, SIGNER_KEYS_ENV_VAR};
pub use unlock::{Argon2PasswordGate, PasswordGate};
