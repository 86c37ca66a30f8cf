//! Headless lifecycle runs for inbound session requests.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::bridge::approval::{Approval, ApprovalPolicy, ApprovalRequest};
use crate::bridge::request::{map_request, RequestMethod, SessionRequest};
use crate::bridge::session::{ErrorReason, PendingRequest, SessionTransport};
use crate::client::TransactionClient;
use crate::error::{Result, TxError};
use crate::lifecycle::{BuildResult, LifecycleState, Stage, TxEngine};
use crate::observability::metrics;
use crate::wallet::{AddressBook, PasswordGate};

const INTERNAL_PANIC_MESSAGE: &str = "Unknown internal error";

/// Maps session requests onto lifecycle runs and answers each exactly once.
pub struct RequestBridge {
    client: Arc<dyn TransactionClient>,
    addresses: AddressBook,
    policy: Arc<dyn ApprovalPolicy>,
    password_gate: Option<Arc<dyn PasswordGate>>,
    transport: Arc<dyn SessionTransport>,
}

impl RequestBridge {
    pub fn new(
        client: Arc<dyn TransactionClient>,
        addresses: AddressBook,
        policy: Arc<dyn ApprovalPolicy>,
        transport: Arc<dyn SessionTransport>,
    ) -> Self {
        Self {
            client,
            addresses,
            policy,
            password_gate: None,
            transport,
        }
    }

    pub fn with_password_gate(mut self, gate: Arc<dyn PasswordGate>) -> Self {
        self.password_gate = Some(gate);
        self
    }

    pub fn transport(&self) -> &Arc<dyn SessionTransport> {
        &self.transport
    }

    /// Process `request` to completion: one response or one disconnect.
    pub async fn handle(&self, request: SessionRequest) {
        let pending = PendingRequest::new(&request);
        let method = request
            .method
            .parse::<RequestMethod>()
            .map(|m| m.as_str())
            .unwrap_or("unsupported");
        tracing::info!(topic = %request.topic, id = request.id, method = %request.method, "Session request received");

        let outcome = AssertUnwindSafe(self.process(&request)).catch_unwind().await;
        let transport = self.transport.as_ref();
        let delivered = match outcome {
            Ok(Ok(result)) => {
                metrics::record_bridge_request(method, "ok");
                pending.respond(transport, result).await
            }
            Ok(Err(e)) => {
                metrics::record_bridge_request(method, e.label());
                pending.reject(transport, ErrorReason::internal(e.to_string())).await
            }
            Err(_) => {
                metrics::record_bridge_request(method, "panic");
                tracing::error!(topic = %request.topic, id = request.id, "Request processing panicked");
                pending.reject(transport, ErrorReason::internal(INTERNAL_PANIC_MESSAGE)).await
            }
        };

        if let Err(e) = delivered {
            tracing::error!(topic = %request.topic, id = request.id, error = %e, "Failed to answer session request");
        }
    }

    async fn process(&self, request: &SessionRequest) -> Result<Value> {
        let draft = map_request(request, &self.addresses)?;
        let mut engine = TxEngine::new(self.client.clone(), self.addresses.clone(), draft);
        if let Some(gate) = &self.password_gate {
            engine = engine.with_password_gate(gate.clone());
        }
        tracing::debug!(topic = %request.topic, id = request.id, run_id = %engine.run_id(), "Headless run started");

        let state = engine.build().await?;

        if state.consolidation_prompt {
            let address = engine.draft().source().hash.clone();
            return match self.policy.review(ApprovalRequest::Consolidation { address: &address }).await {
                Approval::Reject => Err(TxError::Rejected("Consolidation declined".to_string())),
                Approval::Approve { password } => {
                    engine.confirm_consolidation().await?;
                    let state = self.approve_and_send(&engine, password).await?;
                    let transactions = state.outcome.map(|o| o.transactions.len()).unwrap_or_default();
                    Err(TxError::ConsolidationCompleted { transactions })
                }
            };
        }

        let summary = state
            .summary
            .as_ref()
            .ok_or_else(|| TxError::Validation("Built transaction has no summary".to_string()))?;
        match self.policy.review(ApprovalRequest::Transaction(summary)).await {
            Approval::Reject => Err(TxError::Rejected("Transaction rejected".to_string())),
            Approval::Approve { password } => {
                let state = self.approve_and_send(&engine, password).await?;
                sign_response(&state)
            }
        }
    }

    /// Confirm and, when gated, unlock: the two UI steps folded into one.
    async fn approve_and_send(&self, engine: &TxEngine, password: Option<String>) -> Result<LifecycleState> {
        let state = engine.confirm().await?;
        if state.stage != Stage::AwaitingPassword {
            return Ok(state);
        }
        match password {
            Some(password) => engine.submit_password(&password).await,
            None => Err(TxError::InvalidPassword),
        }
    }
}

/// Result payload for a sent run.
fn sign_response(state: &LifecycleState) -> Result<Value> {
    let (Some(build), Some(outcome)) = (&state.build, &state.outcome) else {
        return Err(TxError::Validation("Transaction was not sent".to_string()));
    };
    let response = match build {
        BuildResult::Single(tx) => {
            let sent = outcome
                .transactions
                .first()
                .ok_or_else(|| TxError::Validation("Transaction was not sent".to_string()))?;
            let mut response = json!({
                "txId": sent.tx_id,
                "unsignedTx": tx.unsigned_tx,
                "signature": sent.signature,
                "gasAmount": tx.gas_amount,
                "gasPrice": tx.gas_price.to_string(),
            });
            if let Some(contract_address) = &outcome.contract_address {
                response["contractAddress"] = json!(contract_address);
            }
            response
        }
        BuildResult::Sweep(_) => json!({
            "transactions": outcome
                .transactions
                .iter()
                .map(|sent| json!({ "txId": sent.tx_id, "signature": sent.signature }))
                .collect::<Vec<_>>(),
        }),
    };
    Ok(response)
}
