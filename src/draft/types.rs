//! Draft records for the three transaction kinds.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::draft::fields::ContractField;

/// A wallet address known to the local address set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    /// Address hash (base58).
    pub hash: String,
    /// Hex-encoded public key.
    pub public_key: String,
    /// Spendable balance in minor units, as last refreshed from the node.
    pub available_balance: U256,
}

impl AddressRecord {
    pub fn new(hash: impl Into<String>, public_key: impl Into<String>, available_balance: U256) -> Self {
        Self {
            hash: hash.into(),
            public_key: public_key.into(),
            available_balance,
        }
    }
}

/// Optional gas overrides. `None` lets the node estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasSettings {
    pub gas_amount: Option<u64>,
    pub gas_price: Option<U256>,
}

/// Value transfer to a single destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub source: AddressRecord,
    pub destination: String,
    pub amount: U256,
    pub gas: GasSettings,
}

impl TransferDraft {
    /// A transfer of the whole available balance is built as a sweep.
    ///
    /// Exact equality only: there is no fee headroom threshold.
    pub fn is_sweep(&self) -> bool {
        self.amount == self.source.available_balance
    }
}

/// Contract deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContractDraft {
    pub source: AddressRecord,
    pub bytecode: String,
    pub initial_fields: Vec<ContractField>,
    pub amount: Option<U256>,
    pub issue_token_amount: Option<U256>,
    pub gas: GasSettings,
}

/// Contract call (script execution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContractDraft {
    pub source: AddressRecord,
    pub bytecode: String,
    pub amount: Option<U256>,
    pub gas: GasSettings,
}

/// Variant tag used to key the per-kind dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftKind {
    Transfer,
    DeployContract,
    CallContract,
}

impl DraftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftKind::Transfer => "transfer",
            DraftKind::DeployContract => "deploy-contract",
            DraftKind::CallContract => "call-contract",
        }
    }
}

impl std::fmt::Display for DraftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction intent of any supported kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Transfer(TransferDraft),
    DeployContract(DeployContractDraft),
    CallContract(CallContractDraft),
}

impl Draft {
    pub fn kind(&self) -> DraftKind {
        match self {
            Draft::Transfer(_) => DraftKind::Transfer,
            Draft::DeployContract(_) => DraftKind::DeployContract,
            Draft::CallContract(_) => DraftKind::CallContract,
        }
    }

    /// Source address shared by all variants.
    pub fn source(&self) -> &AddressRecord {
        match self {
            Draft::Transfer(d) => &d.source,
            Draft::DeployContract(d) => &d.source,
            Draft::CallContract(d) => &d.source,
        }
    }

    /// Native amount the draft moves out of the source, zero when unset.
    pub fn requested_amount(&self) -> U256 {
        match self {
            Draft::Transfer(d) => d.amount,
            Draft::DeployContract(d) => d.amount.unwrap_or_default(),
            Draft::CallContract(d) => d.amount.unwrap_or_default(),
        }
    }

    /// Destination for value transfers; contract drafts have none.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Draft::Transfer(d) => Some(d.destination.as_str()),
            _ => None,
        }
    }

    pub fn gas(&self) -> &GasSettings {
        match self {
            Draft::Transfer(d) => &d.gas,
            Draft::DeployContract(d) => &d.gas,
            Draft::CallContract(d) => &d.gas,
        }
    }
}
