//! Session request listener: one request at a time until unsubscribed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bridge::handler::RequestBridge;
use crate::bridge::request::SessionRequest;
use crate::bridge::session::{ErrorReason, PendingRequest};
use crate::runtime::Shutdown;

const SHUTDOWN_MESSAGE: &str = "Wallet is shutting down";

/// Handle to a running listener.
pub struct BridgeListener {
    sender: mpsc::Sender<SessionRequest>,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl BridgeListener {
    /// Queue for inbound requests.
    pub fn sender(&self) -> mpsc::Sender<SessionRequest> {
        self.sender.clone()
    }

    /// Stop accepting requests. The request in progress finishes and queued
    /// ones are closed before this returns.
    pub async fn unsubscribe(self) {
        self.shutdown.trigger();
        drop(self.sender);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Bridge listener task failed");
        }
    }

    /// Wait for the listener to stop on its own (shutdown or closed queue).
    pub async fn join(self) {
        drop(self.sender);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Bridge listener task failed");
        }
    }
}

/// Start serving requests sent to the returned listener.
pub fn subscribe(bridge: Arc<RequestBridge>, capacity: usize, shutdown: Shutdown) -> BridgeListener {
    let (sender, mut receiver) = mpsc::channel::<SessionRequest>(capacity.max(1));
    let mut stop = shutdown.signal();

    let task = tokio::spawn(async move {
        tracing::info!("Bridge listener started");
        loop {
            tokio::select! {
                maybe = receiver.recv() => match maybe {
                    Some(request) => bridge.handle(request).await,
                    None => break,
                },
                _ = stop.triggered() => {
                    tracing::info!("Bridge listener received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        // Anything still queued was accepted and must be answered.
        receiver.close();
        while let Ok(request) = receiver.try_recv() {
            let pending = PendingRequest::new(&request);
            if let Err(e) = pending
                .reject(bridge.transport().as_ref(), ErrorReason::internal(SHUTDOWN_MESSAGE))
                .await
            {
                tracing::error!(topic = %request.topic, error = %e, "Failed to close queued request");
            }
        }
        tracing::info!("Bridge listener stopped");
    });

    BridgeListener { sender, shutdown, task }
}
