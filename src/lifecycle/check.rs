//! Check step output shown before confirmation.

use alloy::primitives::U256;
use serde::Serialize;

use crate::amount::format_amount;
use crate::draft::{ContractField, DraftKind};

/// Why the built transaction moves funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    Single,
    /// Whole balance to the chosen destination.
    Sweep,
    /// Whole balance back to the source to reduce its output count.
    Consolidation,
}

/// What the user (or approval policy) reviews before sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub kind: DraftKind,
    pub purpose: Purpose,
    pub from: String,
    pub to: Option<String>,
    /// Amount that will actually arrive, after fees.
    pub amount: U256,
    pub fee: U256,
    pub transaction_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ContractField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_token_amount: Option<U256>,
}

impl CheckSummary {
    /// One-line human readable description.
    pub fn describe(&self) -> String {
        let target = self.to.as_deref().unwrap_or("contract");
        let action = match self.purpose {
            Purpose::Single => self.kind.to_string(),
            Purpose::Sweep => "sweep".to_string(),
            Purpose::Consolidation => "consolidate".to_string(),
        };
        let mut line = format!(
            "{} {} from {} to {} (fee {})",
            action,
            format_amount(self.amount),
            self.from,
            target,
            format_amount(self.fee)
        );
        if self.transaction_count > 1 {
            line.push_str(&format!(" in {} transactions", self.transaction_count));
        }
        line
    }
}
