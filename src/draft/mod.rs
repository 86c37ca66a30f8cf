//! Transaction drafts.
//!
//! A draft is a not-yet-built transaction intent supplied by the local UI or
//! by the request bridge. Every variant carries the source address record.
//!
//! # Data Flow
//! ```text
//! UI form / bridge params
//!     → types.rs (Draft variants)
//!     → fields.rs (contract initial fields codec)
//!     → validation.rs (pre-build checks)
//!     → lifecycle engine
//! ```

pub mod fields;
pub mod types;
pub mod validation;

pub use fields::{encode_fields, parse_fields, ContractField, FieldType};
pub use types::{
    AddressRecord, CallContractDraft, DeployContractDraft, Draft, DraftKind, GasSettings,
    TransferDraft,
};
pub use validation::{check_address, validate_draft};
