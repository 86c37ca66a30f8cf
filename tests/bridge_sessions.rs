//! Session requests answered through the request bridge.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use alloy::primitives::U256;
use serde_json::{json, Value};

use wallet_txflow::bridge::{
    self, AutoApprovePolicy, ErrorReason, RequestBridge, SessionRequest, INTERNAL_ERROR_CODE,
};
use wallet_txflow::client::TxKind;
use wallet_txflow::runtime::Shutdown;
use wallet_txflow::wallet::AddressBook;

mod common;
use common::{address, record, Call, RecordingSession, ScriptedClient, SessionEvent, StaticPasswordGate};

const ONE_NATIVE: u64 = 1_000_000_000_000_000_000;

struct Harness {
    client: Arc<ScriptedClient>,
    session: Arc<RecordingSession>,
    bridge: RequestBridge,
}

fn harness(client: ScriptedClient, policy: AutoApprovePolicy) -> Harness {
    let client = Arc::new(client);
    let session = Arc::new(RecordingSession::default());
    let book = AddressBook::new();
    book.insert(record(1, 5 * ONE_NATIVE));
    let bridge = RequestBridge::new(client.clone(), book, Arc::new(policy), session.clone());
    Harness { client, session, bridge }
}

fn approve_all() -> AutoApprovePolicy {
    AutoApprovePolicy::new(true, None)
}

fn transfer_request(id: u64, signer: &str) -> SessionRequest {
    SessionRequest {
        topic: "topic-1".into(),
        id,
        method: "alph_signTransferTx".into(),
        params: json!({
            "signerAddress": signer,
            "destinations": [{ "address": address(9), "alphAmount": "1" }]
        }),
    }
}

fn disconnect(message: &str) -> SessionEvent {
    SessionEvent::Disconnect {
        topic: "topic-1".into(),
        reason: ErrorReason::internal(message),
    }
}

#[tokio::test]
async fn test_unknown_signer_closes_session() {
    let h = harness(ScriptedClient::new(), approve_all());
    h.bridge.handle(transfer_request(1, "X")).await;

    assert_eq!(h.session.events(), vec![disconnect("Unknown signer address: X")]);
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_method_closes_session() {
    let h = harness(ScriptedClient::new(), approve_all());
    let request = SessionRequest {
        topic: "topic-1".into(),
        id: 1,
        method: "alph_signMessage".into(),
        params: Value::Null,
    };
    h.bridge.handle(request).await;

    let events = h.session.events();
    assert_eq!(events.len(), 1);
    let SessionEvent::Disconnect { reason, .. } = &events[0] else {
        panic!("expected a disconnect");
    };
    assert_eq!(reason.code, INTERNAL_ERROR_CODE);
    assert!(reason.message.contains("alph_signMessage"));
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn test_approved_transfer_responds_once() {
    let h = harness(ScriptedClient::new(), approve_all());
    h.bridge.handle(transfer_request(7, &address(1))).await;

    let events = h.session.events();
    assert_eq!(events.len(), 1);
    let SessionEvent::Response { topic, id, result } = &events[0] else {
        panic!("expected a response, got {:?}", events[0]);
    };
    assert_eq!(topic, "topic-1");
    assert_eq!(*id, 7);
    assert_eq!(result["txId"], "transfer-tx");
    assert_eq!(result["signature"], "sig-transfer-tx");
    assert_eq!(result["unsignedTx"], "unsigned-transfer-tx");
    assert_eq!(h.client.sent().len(), 1);
}

#[tokio::test]
async fn test_rejected_transfer_is_never_sent() {
    let h = harness(ScriptedClient::new(), AutoApprovePolicy::new(false, None));
    h.bridge.handle(transfer_request(1, &address(1))).await;

    assert_eq!(h.session.events(), vec![disconnect("Transaction rejected")]);
    assert!(h.client.sent().is_empty());
}

#[tokio::test]
async fn test_amount_ceiling() {
    let h = harness(ScriptedClient::new(), AutoApprovePolicy::new(true, Some(U256::from(ONE_NATIVE))));
    // 1 native plus the fee exceeds the ceiling
    h.bridge.handle(transfer_request(1, &address(1))).await;
    assert_eq!(h.session.events(), vec![disconnect("Transaction rejected")]);
}

#[tokio::test]
async fn test_panic_closes_session() {
    let client = ScriptedClient::new();
    client.panic_on_build.store(true, Ordering::SeqCst);
    let h = harness(client, approve_all());
    h.bridge.handle(transfer_request(1, &address(1))).await;

    assert_eq!(h.session.events(), vec![disconnect("Unknown internal error")]);
}

#[tokio::test]
async fn test_send_failure_closes_session() {
    let client = ScriptedClient::new();
    *client.fail_send_at.lock().unwrap() = Some(0);
    let h = harness(client, approve_all());
    h.bridge.handle(transfer_request(1, &address(1))).await;

    assert_eq!(h.session.events(), vec![disconnect("Network error: connection reset")]);
}

#[tokio::test]
async fn test_headless_consolidation_then_resubmit() {
    let client = ScriptedClient {
        sweep_size: 2,
        ..ScriptedClient::new()
    };
    client.consolidation_required.store(true, Ordering::SeqCst);
    let h = harness(client, approve_all());
    h.bridge.handle(transfer_request(1, &address(1))).await;

    assert_eq!(
        h.session.events(),
        vec![disconnect("UTXOs consolidated in 2 transaction(s); resubmit the request")]
    );
    let sent = h.client.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|c| matches!(
        c,
        Call::Send { kind: TxKind::Consolidation, destination: Some(d), .. } if *d == address(1)
    )));
}

#[tokio::test]
async fn test_declined_consolidation() {
    let client = ScriptedClient::new();
    client.consolidation_required.store(true, Ordering::SeqCst);
    let h = harness(client, AutoApprovePolicy::new(false, None));
    h.bridge.handle(transfer_request(1, &address(1))).await;

    assert_eq!(h.session.events(), vec![disconnect("Consolidation declined")]);
    assert!(!h.client.calls().iter().any(|c| matches!(c, Call::BuildSweep { .. })));
}

#[tokio::test]
async fn test_password_required_in_headless_mode() {
    let client = Arc::new(ScriptedClient::new());
    let session = Arc::new(RecordingSession::default());
    let book = AddressBook::new();
    book.insert(record(1, 5 * ONE_NATIVE));

    let without_password = RequestBridge::new(client.clone(), book.clone(), Arc::new(approve_all()), session.clone())
        .with_password_gate(Arc::new(StaticPasswordGate("pw")));
    without_password.handle(transfer_request(1, &address(1))).await;

    let with_password = RequestBridge::new(
        client.clone(),
        book,
        Arc::new(approve_all().with_password("pw")),
        session.clone(),
    )
    .with_password_gate(Arc::new(StaticPasswordGate("pw")));
    with_password.handle(transfer_request(2, &address(1))).await;

    let events = session.events();
    assert_eq!(events[0], disconnect("Invalid password"));
    assert!(matches!(&events[1], SessionEvent::Response { id: 2, .. }));
    assert_eq!(client.sent().len(), 1);
}

#[tokio::test]
async fn test_deploy_response_includes_contract_address() {
    let h = harness(ScriptedClient::new(), approve_all());
    let request = SessionRequest {
        topic: "topic-1".into(),
        id: 3,
        method: "alph_signContractCreationTx".into(),
        params: json!({
            "signerAddress": address(1),
            "bytecode": "0102",
            "initialFields": [{ "type": "U256", "value": "1" }]
        }),
    };
    h.bridge.handle(request).await;

    let events = h.session.events();
    let SessionEvent::Response { result, .. } = &events[0] else {
        panic!("expected a response, got {:?}", events[0]);
    };
    assert_eq!(result["contractAddress"], "contract-addr");
}

#[tokio::test]
async fn test_listener_serves_requests_in_order() {
    let h = harness(ScriptedClient::new(), approve_all());
    let session = h.session.clone();
    let listener = bridge::subscribe(Arc::new(h.bridge), 8, Shutdown::new());

    let sender = listener.sender();
    sender.send(transfer_request(1, &address(1))).await.unwrap();
    sender.send(transfer_request(2, "X")).await.unwrap();
    drop(sender);
    listener.join().await;

    let events = session.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], SessionEvent::Response { id: 1, .. }));
    assert_eq!(events[1], disconnect("Unknown signer address: X"));
}

#[tokio::test]
async fn test_unsubscribe_stops_listener() {
    let h = harness(ScriptedClient::new(), approve_all());
    let shutdown = Shutdown::new();
    let listener = bridge::subscribe(Arc::new(h.bridge), 8, shutdown.clone());
    let sender = listener.sender();

    listener.unsubscribe().await;
    assert!(sender.send(transfer_request(1, &address(1))).await.is_err());
    assert_eq!(shutdown.receiver_count(), 0);
}

#[tokio::test]
async fn test_listener_started_after_shutdown_exits() {
    let h = harness(ScriptedClient::new(), approve_all());
    let shutdown = Shutdown::new();
    shutdown.trigger();

    let listener = bridge::subscribe(Arc::new(h.bridge), 8, shutdown.clone());
    let sender = listener.sender();
    tokio::time::timeout(std::time::Duration::from_secs(1), listener.join())
        .await
        .expect("listener should stop on an earlier shutdown");
    drop(sender);
    assert_eq!(shutdown.receiver_count(), 0);
}
