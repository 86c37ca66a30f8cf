//! Facade data types and error definitions.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::fee_from_gas;
use crate::draft::AddressRecord;

/// Errors returned by the transaction client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Too many unspent outputs to build a single transaction.
    #[error("Consolidation required: {0}")]
    ConsolidationRequired(String),

    /// Connection failure, timeout or server error.
    #[error("Network error: {0}")]
    Network(String),

    /// The node rejected the request parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The signing capability failed.
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// An unsigned single transaction returned by a build call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltTransaction {
    pub tx_id: String,
    pub unsigned_tx: String,
    pub gas_amount: u64,
    pub gas_price: U256,
    /// Present for contract deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl BuiltTransaction {
    pub fn fee(&self) -> U256 {
        fee_from_gas(self.gas_amount, self.gas_price)
    }
}

/// One entry of a sweep sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepTransaction {
    pub tx_id: String,
    pub unsigned_tx: String,
}

/// Ordered sweep sequence. Later entries may spend outputs of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepBuild {
    pub transactions: Vec<SweepTransaction>,
    pub total_fee: U256,
}

/// Transaction kind passed to `sign_and_send` for record keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxKind {
    Transfer,
    Sweep,
    Consolidation,
    DeployContract,
    CallContract,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Transfer => "transfer",
            TxKind::Sweep => "sweep",
            TxKind::Consolidation => "consolidation",
            TxKind::DeployContract => "deploy-contract",
            TxKind::CallContract => "call-contract",
        }
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of a single `sign_and_send` call.
#[derive(Debug, Clone, Copy)]
pub struct SendRequest<'a> {
    pub source: &'a AddressRecord,
    pub tx_id: &'a str,
    pub unsigned_tx: &'a str,
    /// `None` for contract deployments and calls.
    pub destination: Option<&'a str>,
    pub kind: TxKind,
    /// Amount kept with the pending-transaction record.
    pub amount: Option<U256>,
}

/// A broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTransaction {
    pub tx_id: String,
    pub signature: String,
}

/// Record of a submitted transaction, kept until the node confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub tx_id: String,
    pub from: String,
    pub to: Option<String>,
    pub kind: TxKind,
    pub amount: Option<U256>,
    /// Submission time (seconds since epoch).
    pub submitted_at: u64,
}
