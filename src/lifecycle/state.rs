//! Lifecycle stages and pure transition functions.

use alloy::primitives::U256;
use serde::Serialize;

use crate::client::{BuiltTransaction, SentTransaction, SweepBuild, TxKind};
use crate::consolidation::PartialSweep;
use crate::draft::Draft;
use crate::error::{Result, TxError};
use crate::lifecycle::check::CheckSummary;

/// Top-level lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Building,
    AwaitingConfirmation,
    AwaitingPassword,
    Sending,
    Sent,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Sent | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Building => "building",
            Stage::AwaitingConfirmation => "awaiting confirmation",
            Stage::AwaitingPassword => "awaiting password",
            Stage::Sending => "sending",
            Stage::Sent => "sent",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Output of a successful build. Exactly one shape per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum BuildResult {
    Single(BuiltTransaction),
    Sweep(SweepBuild),
}

impl BuildResult {
    pub fn fee(&self) -> U256 {
        match self {
            BuildResult::Single(tx) => tx.fee(),
            BuildResult::Sweep(sweep) => sweep.total_fee,
        }
    }

    pub fn is_sweep(&self) -> bool {
        matches!(self, BuildResult::Sweep(_))
    }

    pub fn transaction_count(&self) -> usize {
        match self {
            BuildResult::Single(_) => 1,
            BuildResult::Sweep(sweep) => sweep.transactions.len(),
        }
    }
}

/// Result of a completed send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub kind: TxKind,
    pub transactions: Vec<SentTransaction>,
    /// Set for contract deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl SendOutcome {
    /// Notification shown once the run is done.
    pub fn message(&self) -> &'static str {
        if self.transactions.len() > 1 {
            "Transactions sent!"
        } else {
            "Transaction sent!"
        }
    }
}

/// Immutable snapshot of a lifecycle run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleState {
    pub stage: Stage,
    /// Set on the first `ConsolidationRequired`; never cleared.
    pub consolidation_required: bool,
    /// The consolidation overlay is waiting for the user.
    pub consolidation_prompt: bool,
    pub build: Option<BuildResult>,
    /// Draft `build` was made from. Sends use it, not later edits.
    #[serde(skip)]
    pub built_from: Option<Draft>,
    pub summary: Option<CheckSummary>,
    pub outcome: Option<SendOutcome>,
    /// Human readable message of the most recent error.
    pub last_error: Option<String>,
    pub partial_sweep: Option<PartialSweep>,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Building,
            consolidation_required: false,
            consolidation_prompt: false,
            build: None,
            built_from: None,
            summary: None,
            outcome: None,
            last_error: None,
            partial_sweep: None,
        }
    }

    fn invalid(&self, action: &'static str) -> TxError {
        let stage = if self.consolidation_prompt {
            "consolidation is pending".to_string()
        } else {
            self.stage.to_string()
        };
        TxError::InvalidTransition { stage, action }
    }

    /// A build may start only in `Building` with no overlay open.
    pub fn ensure_can_build(&self) -> Result<()> {
        if self.stage != Stage::Building || self.consolidation_prompt {
            return Err(self.invalid("build"));
        }
        Ok(())
    }

    /// Draft edits are accepted only while building.
    pub fn ensure_editable(&self) -> Result<()> {
        if self.stage != Stage::Building {
            return Err(self.invalid("edit the draft"));
        }
        Ok(())
    }

    /// Building → AwaitingConfirmation.
    pub fn built(self, draft: Draft, build: BuildResult, summary: CheckSummary) -> Result<Self> {
        self.ensure_can_build()?;
        Ok(Self {
            stage: Stage::AwaitingConfirmation,
            build: Some(build),
            built_from: Some(draft),
            summary: Some(summary),
            last_error: None,
            ..self
        })
    }

    /// Stay in Building, raise the flag and open the overlay.
    pub fn consolidation_needed(self, detail: &str) -> Result<Self> {
        self.ensure_can_build()?;
        Ok(Self {
            consolidation_required: true,
            consolidation_prompt: true,
            last_error: Some(detail.to_string()),
            ..self
        })
    }

    /// Close the overlay to build the consolidation sweep.
    pub fn consolidation_accepted(self) -> Result<Self> {
        if !self.consolidation_prompt {
            return Err(self.invalid("confirm consolidation"));
        }
        Ok(Self {
            consolidation_prompt: false,
            last_error: None,
            ..self
        })
    }

    /// Close the overlay without building. The flag stays set.
    pub fn consolidation_dismissed(self) -> Result<Self> {
        if !self.consolidation_prompt {
            return Err(self.invalid("dismiss consolidation"));
        }
        Ok(Self {
            consolidation_prompt: false,
            ..self
        })
    }

    /// Building → Failed.
    pub fn build_failed(self, error: &TxError) -> Self {
        Self {
            stage: Stage::Failed,
            consolidation_prompt: false,
            last_error: Some(format!("Error while building the transaction: {}", error)),
            ..self
        }
    }

    /// AwaitingConfirmation → AwaitingPassword or Sending.
    pub fn confirmed(self, password_required: bool) -> Result<Self> {
        if self.stage != Stage::AwaitingConfirmation {
            return Err(self.invalid("confirm"));
        }
        let stage = if password_required {
            Stage::AwaitingPassword
        } else {
            Stage::Sending
        };
        Ok(Self { stage, ..self })
    }

    /// AwaitingConfirmation → Building, dropping the build.
    pub fn cancelled(self) -> Result<Self> {
        if self.stage != Stage::AwaitingConfirmation {
            return Err(self.invalid("cancel"));
        }
        Ok(Self {
            stage: Stage::Building,
            build: None,
            built_from: None,
            summary: None,
            ..self
        })
    }

    /// AwaitingPassword → Sending.
    pub fn unlocked(self) -> Result<Self> {
        if self.stage != Stage::AwaitingPassword {
            return Err(self.invalid("unlock"));
        }
        Ok(Self {
            stage: Stage::Sending,
            last_error: None,
            ..self
        })
    }

    /// Wrong password: stage unchanged, error recorded.
    pub fn password_rejected(self) -> Result<Self> {
        if self.stage != Stage::AwaitingPassword {
            return Err(self.invalid("unlock"));
        }
        Ok(Self {
            last_error: Some(TxError::InvalidPassword.to_string()),
            ..self
        })
    }

    /// Sending → Sent.
    pub fn sent(self, outcome: SendOutcome) -> Result<Self> {
        if self.stage != Stage::Sending {
            return Err(self.invalid("complete a send"));
        }
        Ok(Self {
            stage: Stage::Sent,
            outcome: Some(outcome),
            last_error: None,
            ..self
        })
    }

    /// Sending → Failed.
    pub fn send_failed(self, error: &TxError) -> Result<Self> {
        if self.stage != Stage::Sending {
            return Err(self.invalid("fail a send"));
        }
        let partial_sweep = match error {
            TxError::PartialSweep(partial) => Some(partial.clone()),
            _ => None,
        };
        Ok(Self {
            stage: Stage::Failed,
            last_error: Some(format!("Error while sending the transaction: {}", error)),
            partial_sweep,
            ..self
        })
    }
}
