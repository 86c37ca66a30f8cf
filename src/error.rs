//! Error types for the transaction lifecycle.

use thiserror::Error;

use crate::amount::AmountError;
use crate::client::ClientError;
use crate::consolidation::PartialSweep;

/// Errors surfaced by the lifecycle engine, the consolidation sub-flow and
/// the request bridge.
#[derive(Debug, Error)]
pub enum TxError {
    /// A decimal amount could not be converted to minor units.
    #[error("Unable to convert the amount: {0}")]
    AmountParse(String),

    /// Bad destination, gas settings, bytecode or amount.
    #[error("{0}")]
    Validation(String),

    /// The source address holds too many unspent outputs.
    #[error("Consolidation required: {0}")]
    ConsolidationRequired(String),

    /// Transient network failure. Never retried automatically.
    #[error("Network error: {0}")]
    Network(String),

    /// Signing failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The signer address of an inbound request is not in the address set.
    #[error("Unknown signer address: {0}")]
    UnknownSignerAddress(String),

    /// Inbound request method is not one of the supported signing methods.
    #[error("Unsupported request method: {0}")]
    UnsupportedRequestMethod(String),

    /// A build or send is already outstanding on this lifecycle.
    #[error("Another operation is already in progress")]
    Busy,

    /// The requested action is not valid in the current stage.
    #[error("Cannot {action} while {stage}")]
    InvalidTransition { stage: String, action: &'static str },

    /// The local approval gate rejected the password.
    #[error("Invalid password")]
    InvalidPassword,

    /// The user or approval policy declined.
    #[error("{0}")]
    Rejected(String),

    /// A multi-transaction sweep stopped partway.
    #[error("{0}")]
    PartialSweep(PartialSweep),

    /// Headless consolidation finished; the original request must be resubmitted.
    #[error("UTXOs consolidated in {transactions} transaction(s); resubmit the request")]
    ConsolidationCompleted { transactions: usize },

    /// The session transport failed to deliver a response.
    #[error("Session error: {0}")]
    Session(String),
}

impl TxError {
    /// Stable label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TxError::AmountParse(_) => "amount_parse",
            TxError::Validation(_) => "validation",
            TxError::ConsolidationRequired(_) => "consolidation_required",
            TxError::Network(_) => "network",
            TxError::Signing(_) => "signing",
            TxError::UnknownSignerAddress(_) => "unknown_signer",
            TxError::UnsupportedRequestMethod(_) => "unsupported_method",
            TxError::Busy => "busy",
            TxError::InvalidTransition { .. } => "invalid_transition",
            TxError::InvalidPassword => "invalid_password",
            TxError::Rejected(_) => "rejected",
            TxError::PartialSweep(_) => "partial_sweep",
            TxError::ConsolidationCompleted { .. } => "consolidated",
            TxError::Session(_) => "session",
        }
    }
}

impl From<ClientError> for TxError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ConsolidationRequired(detail) => TxError::ConsolidationRequired(detail),
            ClientError::Network(msg) => TxError::Network(msg),
            ClientError::Validation(msg) => TxError::Validation(msg),
            ClientError::Signing(msg) => TxError::Signing(msg),
        }
    }
}

impl From<AmountError> for TxError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::Parse(msg) => TxError::AmountParse(msg),
            other => TxError::Validation(other.to_string()),
        }
    }
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, TxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_mapping() {
        let err: TxError = ClientError::ConsolidationRequired("consolidate first".into()).into();
        assert!(matches!(err, TxError::ConsolidationRequired(_)));

        let err: TxError = ClientError::Network("timeout".into()).into();
        assert_eq!(err.to_string(), "Network error: timeout");
    }

    #[test]
    fn test_unknown_signer_display() {
        let err = TxError::UnknownSignerAddress("X".into());
        assert_eq!(err.to_string(), "Unknown signer address: X");
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = TxError::InvalidTransition {
            stage: "Sending".into(),
            action: "build",
        };
        assert_eq!(err.to_string(), "Cannot build while Sending");
    }
}
