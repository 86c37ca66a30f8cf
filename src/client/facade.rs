//! The network/signing collaborator consumed by the lifecycle engine.

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::client::types::{BuiltTransaction, ClientResult, SendRequest, SentTransaction, SweepBuild};
use crate::draft::{AddressRecord, CallContractDraft, DeployContractDraft, GasSettings};

/// Build, sign and broadcast transactions against the network.
///
/// Only `build_transfer` may fail with `ClientError::ConsolidationRequired`.
/// `build_sweep` is the consolidation path and never requires it.
#[async_trait]
pub trait TransactionClient: Send + Sync {
    /// Build a single value transfer.
    async fn build_transfer(
        &self,
        source: &AddressRecord,
        destination: &str,
        amount: U256,
        gas: &GasSettings,
    ) -> ClientResult<BuiltTransaction>;

    /// Build the ordered sweep sequence moving the whole balance to `destination`.
    async fn build_sweep(&self, source: &AddressRecord, destination: &str) -> ClientResult<SweepBuild>;

    /// Build a contract deployment.
    async fn build_deploy_contract(&self, draft: &DeployContractDraft) -> ClientResult<BuiltTransaction>;

    /// Build a contract call.
    async fn build_call_contract(&self, draft: &CallContractDraft) -> ClientResult<BuiltTransaction>;

    /// Sign the transaction id with the source key and broadcast.
    async fn sign_and_send(&self, request: SendRequest<'_>) -> ClientResult<SentTransaction>;

    /// Current available balance of `address` in minor units.
    async fn fetch_balance(&self, address: &str) -> ClientResult<U256>;
}
