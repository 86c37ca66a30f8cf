//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WalletConfig (validated, immutable)
//!     → shared by the binaries to build client, address set and bridge
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Signing keys never live in the file; see `wallet::signer`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AddressEntry, BridgeConfig, NodeConfig, ObservabilityConfig, WalletConfig, WalletSection};
pub use validation::ValidationError;
