//! Full node REST client with timeout and failover.
//!
//! # Responsibilities
//! - Build transfer, sweep, deploy and script transactions
//! - Submit signed transactions and keep a pending record
//! - Query available balances
//! - Convert the node's "needs consolidating" rejection into a typed error

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::primitives::U256;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use url::Url;

use crate::client::facade::TransactionClient;
use crate::client::types::{
    BuiltTransaction, ClientError, ClientResult, PendingTransaction, SendRequest, SentTransaction,
    SweepBuild, SweepTransaction,
};
use crate::config::NodeConfig;
use crate::draft::{AddressRecord, CallContractDraft, ContractField, DeployContractDraft, GasSettings};
use crate::observability::metrics;
use crate::wallet::TxSigner;

/// REST client for one or more full nodes.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    /// Primary node followed by failovers.
    nodes: Vec<Url>,
    timeout_duration: Duration,
    signer: Arc<dyn TxSigner>,
    pending: Arc<DashMap<String, PendingTransaction>>,
    /// Pending records older than this are dropped.
    pending_ttl: Duration,
}

/// Upper bound on pending records; the oldest is evicted beyond it.
const MAX_PENDING_TRANSACTIONS: usize = 1024;

impl NodeClient {
    /// Create a client from configuration.
    ///
    /// Invalid failover URLs are skipped with a warning; an invalid primary
    /// URL is an error.
    pub fn new(config: &NodeConfig, signer: Arc<dyn TxSigner>) -> ClientResult<Self> {
        let mut nodes = vec![base_url(&config.rpc_url)
            .map_err(|e| ClientError::Validation(format!("Invalid node URL '{}': {}", config.rpc_url, e)))?];

        for url_str in &config.failover_urls {
            match base_url(url_str) {
                Ok(url) => nodes.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover node URL"),
            }
        }

        // Node connections never go through system proxies.
        let http = reqwest::Client::builder()
            .no_proxy()
            .user_agent(concat!("wallet-txflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("HTTP client setup failed: {}", e)))?;

        tracing::info!(
            rpc_url = %config.rpc_url,
            failover_count = nodes.len() - 1,
            "Node client initialized"
        );

        Ok(Self {
            http,
            nodes,
            timeout_duration: Duration::from_secs(config.request_timeout_secs),
            signer,
            pending: Arc::new(DashMap::new()),
            pending_ttl: Duration::from_secs(config.pending_ttl_secs),
        })
    }

    /// Transactions submitted through this client and not yet cleared.
    pub fn pending_transactions(&self) -> Vec<PendingTransaction> {
        self.prune_pending();
        let mut pending: Vec<_> = self.pending.iter().map(|e| e.value().clone()).collect();
        pending.sort_by_key(|p| p.submitted_at);
        pending
    }

    /// Drop a pending record once the transaction is confirmed.
    pub fn clear_pending(&self, tx_id: &str) -> Option<PendingTransaction> {
        self.pending.remove(tx_id).map(|(_, p)| p)
    }

    /// Drop records older than the pending TTL; returns how many went.
    pub fn prune_pending(&self) -> usize {
        self.prune_pending_at(now_secs())
    }

    fn prune_pending_at(&self, now: u64) -> usize {
        let ttl = self.pending_ttl.as_secs();
        let before = self.pending.len();
        self.pending.retain(|_, p| now.saturating_sub(p.submitted_at) < ttl);
        let dropped = before.saturating_sub(self.pending.len());
        if dropped > 0 {
            tracing::debug!(dropped, "Expired pending transactions");
        }
        dropped
    }

    fn record_pending(&self, record: PendingTransaction) {
        self.prune_pending_at(record.submitted_at);
        self.pending.insert(record.tx_id.clone(), record);
        while self.pending.len() > MAX_PENDING_TRANSACTIONS {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|e| e.value().submitted_at)
                .map(|e| e.key().clone());
            match oldest {
                Some(tx_id) => {
                    self.pending.remove(&tx_id);
                }
                None => break,
            }
        }
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        for (i, base) in self.nodes.iter().enumerate() {
            let url = base
                .join(path)
                .map_err(|e| ClientError::Validation(format!("Invalid request path '{}': {}", path, e)))?;
            let mut req = self.http.request(method.clone(), url);
            if let Some(body) = body {
                req = req.json(body);
            }

            match timeout(self.timeout_duration, req.send()).await {
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        return match timeout(self.timeout_duration, response.json::<T>()).await {
                            Ok(Ok(parsed)) => Ok(parsed),
                            Ok(Err(e)) => Err(ClientError::Network(format!("Malformed node response: {}", e))),
                            Err(_) => Err(ClientError::Network("Node response timed out".to_string())),
                        };
                    }
                    if status.is_client_error() {
                        // The node understood and refused; another node would answer the same.
                        let text = response.text().await.unwrap_or_default();
                        return Err(classify_rejection(&text));
                    }
                    metrics::record_node_failure(i);
                    tracing::warn!(node_idx = i, status = status.as_u16(), path, "Node error, trying next node");
                }
                Ok(Err(e)) => {
                    metrics::record_node_failure(i);
                    tracing::warn!(node_idx = i, error = %e, path, "Node unreachable, trying next node");
                }
                Err(_) => {
                    metrics::record_node_failure(i);
                    tracing::warn!(node_idx = i, path, "Node timeout, trying next node");
                }
            }
        }
        Err(ClientError::Network(format!("All nodes failed for {}", path)))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }
}

fn base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    // `join` replaces the last segment unless the base ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Map a 4xx body to a typed error. This is the only place the
/// consolidation signal is recognised.
fn classify_rejection(body: &str) -> ClientError {
    let detail = serde_json::from_str::<NodeErrorBody>(body)
        .map(|b| b.detail)
        .unwrap_or_else(|_| body.trim().to_string());
    if detail.to_lowercase().contains("consolidat") {
        ClientError::ConsolidationRequired(detail)
    } else {
        ClientError::Validation(detail)
    }
}

fn no_fields(fields: &&[ContractField]) -> bool {
    fields.is_empty()
}

fn parse_minor(value: &str) -> ClientResult<U256> {
    U256::from_str_radix(value, 10)
        .map_err(|e| ClientError::Network(format!("Malformed amount '{}' in node response: {}", value, e)))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct NodeErrorBody {
    detail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Destination<'a> {
    address: &'a str,
    atto_alph_amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildTransferBody<'a> {
    from_public_key: &'a str,
    destinations: Vec<Destination<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_price: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildSweepBody<'a> {
    from_public_key: &'a str,
    to_address: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildDeployBody<'a> {
    from_public_key: &'a str,
    bytecode: &'a str,
    #[serde(skip_serializing_if = "no_fields")]
    initial_fields: &'a [ContractField],
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_atto_alph_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_token_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_price: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildScriptBody<'a> {
    from_public_key: &'a str,
    bytecode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    atto_alph_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnsignedTxResponse {
    tx_id: String,
    unsigned_tx: String,
    gas_amount: u64,
    gas_price: String,
    #[serde(default)]
    contract_address: Option<String>,
}

impl UnsignedTxResponse {
    fn into_built(self) -> ClientResult<BuiltTransaction> {
        Ok(BuiltTransaction {
            gas_price: parse_minor(&self.gas_price)?,
            tx_id: self.tx_id,
            unsigned_tx: self.unsigned_tx,
            gas_amount: self.gas_amount,
            contract_address: self.contract_address,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SweepResponse {
    unsigned_txs: Vec<UnsignedTxResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    unsigned_tx: &'a str,
    signature: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    balance: String,
    #[serde(default)]
    locked_balance: Option<String>,
}

#[async_trait]
impl TransactionClient for NodeClient {
    async fn build_transfer(
        &self,
        source: &AddressRecord,
        destination: &str,
        amount: U256,
        gas: &GasSettings,
    ) -> ClientResult<BuiltTransaction> {
        let body = BuildTransferBody {
            from_public_key: &source.public_key,
            destinations: vec![Destination {
                address: destination,
                atto_alph_amount: amount.to_string(),
            }],
            gas_amount: gas.gas_amount,
            gas_price: gas.gas_price.map(|p| p.to_string()),
        };
        let response: UnsignedTxResponse = self.post("transactions/build", &body).await?;
        response.into_built()
    }

    async fn build_sweep(&self, source: &AddressRecord, destination: &str) -> ClientResult<SweepBuild> {
        let body = BuildSweepBody {
            from_public_key: &source.public_key,
            to_address: destination,
        };
        let response: SweepResponse = self.post("transactions/sweep-address/build", &body).await?;
        if response.unsigned_txs.is_empty() {
            return Err(ClientError::Validation("Nothing to sweep".to_string()));
        }

        let mut total_fee = U256::ZERO;
        let mut transactions = Vec::with_capacity(response.unsigned_txs.len());
        for tx in response.unsigned_txs {
            let built = tx.into_built()?;
            total_fee = total_fee.saturating_add(built.fee());
            transactions.push(SweepTransaction {
                tx_id: built.tx_id,
                unsigned_tx: built.unsigned_tx,
            });
        }
        Ok(SweepBuild { transactions, total_fee })
    }

    async fn build_deploy_contract(&self, draft: &DeployContractDraft) -> ClientResult<BuiltTransaction> {
        let body = BuildDeployBody {
            from_public_key: &draft.source.public_key,
            bytecode: draft.bytecode.trim(),
            initial_fields: &draft.initial_fields,
            initial_atto_alph_amount: draft.amount.map(|a| a.to_string()),
            issue_token_amount: draft.issue_token_amount.map(|a| a.to_string()),
            gas_amount: draft.gas.gas_amount,
            gas_price: draft.gas.gas_price.map(|p| p.to_string()),
        };
        let response: UnsignedTxResponse = self.post("contracts/unsigned-tx/deploy-contract", &body).await?;
        response.into_built()
    }

    async fn build_call_contract(&self, draft: &CallContractDraft) -> ClientResult<BuiltTransaction> {
        let body = BuildScriptBody {
            from_public_key: &draft.source.public_key,
            bytecode: draft.bytecode.trim(),
            atto_alph_amount: draft.amount.map(|a| a.to_string()),
            gas_amount: draft.gas.gas_amount,
            gas_price: draft.gas.gas_price.map(|p| p.to_string()),
        };
        let response: UnsignedTxResponse = self.post("contracts/unsigned-tx/execute-script", &body).await?;
        response.into_built()
    }

    async fn sign_and_send(&self, request: SendRequest<'_>) -> ClientResult<SentTransaction> {
        let signature = self.signer.sign(&request.source.hash, request.tx_id).await?;
        let body = SubmitBody {
            unsigned_tx: request.unsigned_tx,
            signature: &signature,
        };
        let response: SubmitResponse = self.post("transactions/submit", &body).await?;

        self.record_pending(PendingTransaction {
            tx_id: response.tx_id.clone(),
            from: request.source.hash.clone(),
            to: request.destination.map(str::to_owned),
            kind: request.kind,
            amount: request.amount,
            submitted_at: now_secs(),
        });

        tracing::info!(
            tx_id = %response.tx_id,
            from = %request.source.hash,
            kind = %request.kind,
            "Transaction submitted"
        );

        Ok(SentTransaction {
            tx_id: response.tx_id,
            signature,
        })
    }

    async fn fetch_balance(&self, address: &str) -> ClientResult<U256> {
        let response: BalanceResponse = self.get(&format!("addresses/{}/balance", address)).await?;
        let balance = parse_minor(&response.balance)?;
        let locked = match response.locked_balance.as_deref() {
            Some(locked) => parse_minor(locked)?,
            None => U256::ZERO,
        };
        Ok(balance.saturating_sub(locked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TxKind;
    use crate::wallet::KeyringSigner;

    #[test]
    fn test_classify_consolidation() {
        let body = r#"{"detail":"Too many inputs for the transfer, consider to reduce the amount to send, or use the `sweep-address` endpoint to consolidate the inputs first"}"#;
        assert!(matches!(classify_rejection(body), ClientError::ConsolidationRequired(_)));
    }

    #[test]
    fn test_classify_other_rejection() {
        let body = r#"{"detail":"Not enough balance"}"#;
        assert_eq!(
            classify_rejection(body),
            ClientError::Validation("Not enough balance".to_string())
        );
        // Non-JSON bodies keep their text
        assert_eq!(
            classify_rejection("bad request\n"),
            ClientError::Validation("bad request".to_string())
        );
    }

    fn record(tx_id: &str, submitted_at: u64) -> PendingTransaction {
        PendingTransaction {
            tx_id: tx_id.to_string(),
            from: "from".to_string(),
            to: None,
            kind: TxKind::Transfer,
            amount: None,
            submitted_at,
        }
    }

    fn client_with_ttl(ttl_secs: u64) -> NodeClient {
        let config = NodeConfig {
            pending_ttl_secs: ttl_secs,
            ..NodeConfig::default()
        };
        NodeClient::new(&config, Arc::new(KeyringSigner::new())).unwrap()
    }

    #[test]
    fn test_pending_records_expire() {
        let client = client_with_ttl(60);
        client.record_pending(record("old", 1_000));
        client.record_pending(record("fresh", 1_050));
        assert_eq!(client.pending.len(), 2);

        assert_eq!(client.prune_pending_at(1_065), 1);
        assert!(client.pending.contains_key("fresh"));
        assert!(!client.pending.contains_key("old"));

        // Recording a newer transaction drops stale ones too
        client.record_pending(record("newest", 2_000));
        assert_eq!(client.pending.len(), 1);
        assert!(client.pending.contains_key("newest"));
    }

    #[test]
    fn test_pending_records_are_capped() {
        let client = client_with_ttl(u64::MAX);
        for i in 0..=MAX_PENDING_TRANSACTIONS as u64 {
            client.record_pending(record(&format!("tx-{}", i), 1_000 + i));
        }
        assert_eq!(client.pending.len(), MAX_PENDING_TRANSACTIONS);
        assert!(!client.pending.contains_key("tx-0"));
        assert!(client.pending.contains_key(&format!("tx-{}", MAX_PENDING_TRANSACTIONS)));
    }

    #[test]
    fn test_base_url_keeps_path() {
        let url = base_url("http://node.local:22973/api").unwrap();
        assert_eq!(
            url.join("transactions/build").unwrap().as_str(),
            "http://node.local:22973/api/transactions/build"
        );
    }

    #[test]
    fn test_parse_minor() {
        assert_eq!(parse_minor("100000000000").unwrap(), U256::from(100_000_000_000u64));
        assert!(parse_minor("1.5").is_err());
    }
}
