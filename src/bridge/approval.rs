//! The single approval step of headless runs.

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::lifecycle::CheckSummary;

/// What the policy is asked to approve.
#[derive(Debug, Clone, Copy)]
pub enum ApprovalRequest<'a> {
    /// A built transaction, reviewed once in place of confirm + password.
    Transaction(&'a CheckSummary),
    /// The source needs consolidation before the request can be built.
    Consolidation { address: &'a str },
}

/// Policy decision.
#[derive(Clone, PartialEq, Eq)]
pub enum Approval {
    /// Proceed, unlocking with `password` when the wallet requires one.
    Approve { password: Option<String> },
    Reject,
}

impl std::fmt::Debug for Approval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approval::Approve { .. } => f.write_str("Approve"),
            Approval::Reject => f.write_str("Reject"),
        }
    }
}

/// Decides inbound requests without a UI.
#[async_trait]
pub trait ApprovalPolicy: Send + Sync {
    async fn review(&self, request: ApprovalRequest<'_>) -> Approval;
}

/// Approves everything up to an optional amount ceiling, or nothing when
/// disabled.
#[derive(Clone, Default)]
pub struct AutoApprovePolicy {
    enabled: bool,
    max_amount: Option<U256>,
    password: Option<String>,
}

impl AutoApprovePolicy {
    pub fn new(enabled: bool, max_amount: Option<U256>) -> Self {
        Self {
            enabled,
            max_amount,
            password: None,
        }
    }

    /// Password handed to the gate when the wallet requires one.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    fn approve(&self) -> Approval {
        Approval::Approve {
            password: self.password.clone(),
        }
    }
}

#[async_trait]
impl ApprovalPolicy for AutoApprovePolicy {
    async fn review(&self, request: ApprovalRequest<'_>) -> Approval {
        if !self.enabled {
            return Approval::Reject;
        }
        match request {
            ApprovalRequest::Consolidation { .. } => self.approve(),
            ApprovalRequest::Transaction(summary) => match self.max_amount {
                Some(max) if summary.amount.saturating_add(summary.fee) > max => {
                    tracing::info!(amount = %summary.amount, max = %max, "Request above auto-approve limit");
                    Approval::Reject
                }
                _ => self.approve(),
            },
        }
    }
}
