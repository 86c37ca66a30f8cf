//! Sweep building and sequential sending.

use serde::Serialize;

use crate::amount::expected_amount_after_fees;
use crate::client::{SendRequest, SentTransaction, SweepBuild, TransactionClient, TxKind};
use crate::draft::{AddressRecord, DraftKind};
use crate::error::Result;
use crate::lifecycle::{CheckSummary, Purpose};
use crate::observability::metrics;

/// Record of a sweep sequence that stopped partway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSweep {
    /// Transaction ids broadcast before the failure, in order.
    pub sent: Vec<String>,
    /// Index of the entry that failed; later entries were not attempted.
    pub failed_index: usize,
    pub total: usize,
    pub cause: String,
}

impl std::fmt::Display for PartialSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sweep stopped at transaction {} of {} after {} broadcast: {}",
            self.failed_index + 1,
            self.total,
            self.sent.len(),
            self.cause
        )
    }
}

/// Build the sweep-to-self that reduces the source's output count.
pub async fn build_consolidation(client: &dyn TransactionClient, source: &AddressRecord) -> Result<SweepBuild> {
    tracing::info!(address = %source.hash, "Building consolidation sweep");
    let sweep = client.build_sweep(source, &source.hash).await?;
    tracing::debug!(
        address = %source.hash,
        transactions = sweep.transactions.len(),
        total_fee = %sweep.total_fee,
        "Consolidation sweep built"
    );
    Ok(sweep)
}

/// Send every entry of `sweep` in order, stopping at the first failure.
pub async fn send_sweep(
    client: &dyn TransactionClient,
    source: &AddressRecord,
    sweep: &SweepBuild,
    destination: &str,
    kind: TxKind,
) -> std::result::Result<Vec<SentTransaction>, PartialSweep> {
    let total = sweep.transactions.len();
    let mut sent = Vec::with_capacity(total);

    for (index, tx) in sweep.transactions.iter().enumerate() {
        let request = SendRequest {
            source,
            tx_id: &tx.tx_id,
            unsigned_tx: &tx.unsigned_tx,
            destination: Some(destination),
            kind,
            amount: None,
        };
        match client.sign_and_send(request).await {
            Ok(result) => {
                tracing::debug!(index, total, tx_id = %result.tx_id, kind = %kind, "Sweep transaction sent");
                sent.push(result);
            }
            Err(e) => {
                let partial = PartialSweep {
                    sent: sent.iter().map(|s: &SentTransaction| s.tx_id.clone()).collect(),
                    failed_index: index,
                    total,
                    cause: e.to_string(),
                };
                tracing::warn!(
                    address = %source.hash,
                    kind = %kind,
                    failed_index = index,
                    total,
                    broadcast = ?partial.sent,
                    error = %e,
                    "Sweep sequence aborted"
                );
                return Err(partial);
            }
        }
    }

    if kind == TxKind::Consolidation {
        metrics::record_consolidation(total);
    }
    Ok(sent)
}

/// Check-step summary for a consolidation sweep.
pub fn summarize_consolidation(source: &AddressRecord, sweep: &SweepBuild) -> CheckSummary {
    let available = source.available_balance;
    CheckSummary {
        kind: DraftKind::Transfer,
        purpose: Purpose::Consolidation,
        from: source.hash.clone(),
        to: Some(source.hash.clone()),
        amount: expected_amount_after_fees(available, sweep.total_fee, available),
        fee: sweep.total_fee,
        transaction_count: sweep.transactions.len(),
        bytecode: None,
        fields: None,
        issue_token_amount: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use crate::client::SweepTransaction;

    #[test]
    fn test_partial_sweep_display() {
        let partial = PartialSweep {
            sent: vec!["a".into()],
            failed_index: 1,
            total: 3,
            cause: "Network error: timeout".into(),
        };
        assert_eq!(
            partial.to_string(),
            "Sweep stopped at transaction 2 of 3 after 1 broadcast: Network error: timeout"
        );
    }

    #[test]
    fn test_consolidation_summary_targets_source() {
        let source = AddressRecord::new("addr", "02aa", U256::from(1_000_000u64));
        let sweep = SweepBuild {
            transactions: vec![
                SweepTransaction { tx_id: "a".into(), unsigned_tx: "00".into() },
                SweepTransaction { tx_id: "b".into(), unsigned_tx: "01".into() },
            ],
            total_fee: U256::from(2_000u64),
        };
        let summary = summarize_consolidation(&source, &sweep);
        assert_eq!(summary.to.as_deref(), Some("addr"));
        assert_eq!(summary.amount, U256::from(998_000u64));
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.purpose, Purpose::Consolidation);
    }
}
