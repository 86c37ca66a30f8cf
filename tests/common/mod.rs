//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::U256;
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use wallet_txflow::bridge::{ErrorReason, SessionTransport};
use wallet_txflow::client::{
    BuiltTransaction, ClientError, ClientResult, SendRequest, SentTransaction, SweepBuild, SweepTransaction,
    TransactionClient, TxKind,
};
use wallet_txflow::draft::{AddressRecord, CallContractDraft, DeployContractDraft, GasSettings};
use wallet_txflow::wallet::PasswordGate;

/// A well-formed base58 address derived from `seed`.
pub fn address(seed: u8) -> String {
    let mut bytes = [seed; 33];
    bytes[0] = 0;
    bs58::encode(bytes).into_string()
}

pub fn record(seed: u8, balance: u64) -> AddressRecord {
    AddressRecord::new(address(seed), format!("02{:02x}", seed), U256::from(balance))
}

/// A call observed by [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BuildTransfer { destination: String, amount: U256 },
    BuildSweep { destination: String },
    BuildDeploy,
    BuildCall,
    Send { tx_id: String, kind: TxKind, destination: Option<String> },
    FetchBalance(String),
}

/// In-memory transaction client with scripted outcomes.
pub struct ScriptedClient {
    pub calls: Mutex<Vec<Call>>,
    /// Fee of every single-transaction build is `gas_amount * gas_price`.
    pub gas_amount: u64,
    pub gas_price: U256,
    /// Number of entries returned by `build_sweep`.
    pub sweep_size: usize,
    pub sweep_fee: U256,
    /// Balance reported by `fetch_balance`.
    pub balance: U256,
    pub consolidation_required: AtomicBool,
    pub build_error: Mutex<Option<ClientError>>,
    pub panic_on_build: AtomicBool,
    /// Index (across all sends) of the send that fails.
    pub fail_send_at: Mutex<Option<usize>>,
    pub sends: AtomicUsize,
    /// When set, sends wait for `release_sends` after signalling `send_started`.
    pub hold_sends: AtomicBool,
    pub send_started: Notify,
    /// When set, `build_transfer` waits for `release_builds` after
    /// signalling `build_started`.
    pub hold_builds: AtomicBool,
    pub build_started: Notify,
    pub release: Notify,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            gas_amount: 1,
            gas_price: U256::from(2_000u64),
            sweep_size: 1,
            sweep_fee: U256::from(2_000u64),
            balance: U256::from(42u64),
            consolidation_required: AtomicBool::new(false),
            build_error: Mutex::new(None),
            panic_on_build: AtomicBool::new(false),
            fail_send_at: Mutex::new(None),
            sends: AtomicUsize::new(0),
            hold_sends: AtomicBool::new(false),
            send_started: Notify::new(),
            hold_builds: AtomicBool::new(false),
            build_started: Notify::new(),
            release: Notify::new(),
        }
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| matches!(c, Call::Send { .. })).collect()
    }

    pub fn release_sends(&self) {
        self.hold_sends.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    pub fn release_builds(&self) {
        self.hold_builds.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_build(&self) -> ClientResult<()> {
        if self.panic_on_build.load(Ordering::SeqCst) {
            panic!("scripted panic");
        }
        match self.build_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn built(&self, tx_id: &str) -> BuiltTransaction {
        BuiltTransaction {
            tx_id: tx_id.to_string(),
            unsigned_tx: format!("unsigned-{}", tx_id),
            gas_amount: self.gas_amount,
            gas_price: self.gas_price,
            contract_address: None,
        }
    }
}

#[async_trait]
impl TransactionClient for ScriptedClient {
    async fn build_transfer(
        &self,
        _source: &AddressRecord,
        destination: &str,
        amount: U256,
        _gas: &GasSettings,
    ) -> ClientResult<BuiltTransaction> {
        self.record(Call::BuildTransfer {
            destination: destination.to_string(),
            amount,
        });
        if self.hold_builds.load(Ordering::SeqCst) {
            let released = self.release.notified();
            self.build_started.notify_one();
            released.await;
        }
        self.check_build()?;
        if self.consolidation_required.load(Ordering::SeqCst) {
            return Err(ClientError::ConsolidationRequired(
                "Too many inputs, consolidate the inputs first".to_string(),
            ));
        }
        Ok(self.built("transfer-tx"))
    }

    async fn build_sweep(&self, _source: &AddressRecord, destination: &str) -> ClientResult<SweepBuild> {
        self.record(Call::BuildSweep {
            destination: destination.to_string(),
        });
        self.check_build()?;
        let transactions = (0..self.sweep_size)
            .map(|i| {
                let tx_id = ((b'A' + i as u8) as char).to_string();
                SweepTransaction {
                    unsigned_tx: format!("unsigned-{}", tx_id),
                    tx_id,
                }
            })
            .collect();
        Ok(SweepBuild {
            transactions,
            total_fee: self.sweep_fee,
        })
    }

    async fn build_deploy_contract(&self, _draft: &DeployContractDraft) -> ClientResult<BuiltTransaction> {
        self.record(Call::BuildDeploy);
        self.check_build()?;
        if self.consolidation_required.load(Ordering::SeqCst) {
            return Err(ClientError::ConsolidationRequired("consolidate".to_string()));
        }
        let mut built = self.built("deploy-tx");
        built.contract_address = Some("contract-addr".to_string());
        Ok(built)
    }

    async fn build_call_contract(&self, _draft: &CallContractDraft) -> ClientResult<BuiltTransaction> {
        self.record(Call::BuildCall);
        self.check_build()?;
        Ok(self.built("call-tx"))
    }

    async fn sign_and_send(&self, request: SendRequest<'_>) -> ClientResult<SentTransaction> {
        self.record(Call::Send {
            tx_id: request.tx_id.to_string(),
            kind: request.kind,
            destination: request.destination.map(str::to_owned),
        });
        if self.hold_sends.load(Ordering::SeqCst) {
            let released = self.release.notified();
            self.send_started.notify_one();
            released.await;
        }
        let index = self.sends.fetch_add(1, Ordering::SeqCst);
        if *self.fail_send_at.lock().unwrap() == Some(index) {
            return Err(ClientError::Network("connection reset".to_string()));
        }
        Ok(SentTransaction {
            tx_id: request.tx_id.to_string(),
            signature: format!("sig-{}", request.tx_id),
        })
    }

    async fn fetch_balance(&self, address: &str) -> ClientResult<U256> {
        self.record(Call::FetchBalance(address.to_string()));
        Ok(self.balance)
    }
}

/// Password gate accepting a single fixed password.
pub struct StaticPasswordGate(pub &'static str);

#[async_trait]
impl PasswordGate for StaticPasswordGate {
    async fn verify(&self, password: &str) -> wallet_txflow::Result<bool> {
        Ok(password == self.0)
    }
}

/// What the bridge sent back to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Response { topic: String, id: u64, result: Value },
    Disconnect { topic: String, reason: ErrorReason },
}

/// Session transport that records every outbound message.
#[derive(Default)]
pub struct RecordingSession {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSession {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionTransport for RecordingSession {
    async fn respond(&self, topic: &str, id: u64, result: Value) -> wallet_txflow::Result<()> {
        self.events.lock().unwrap().push(SessionEvent::Response {
            topic: topic.to_string(),
            id,
            result,
        });
        Ok(())
    }

    async fn disconnect(&self, topic: &str, reason: ErrorReason) -> wallet_txflow::Result<()> {
        self.events.lock().unwrap().push(SessionEvent::Disconnect {
            topic: topic.to_string(),
            reason,
        });
        Ok(())
    }
}

/// Start a programmable mock node on an ephemeral port.
///
/// The handler receives the request line (`"POST /transactions/build"`) and
/// the body, and returns the status code and JSON body.
pub async fn start_programmable_node<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some((request_line, body)) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request_line, body).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some((format!("{} {}", method, path), body))
}
