//! Daemon-wide stop flag.
//!
//! Built on a `watch` channel rather than a broadcast: the stdio reader and
//! the bridge listener subscribe at different points during startup, and a
//! signal delivered before one of them subscribes must still stop it.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared stop flag. Clones refer to the same flag.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Handle a task awaits to learn that the daemon is stopping.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal { rx: self.tx.subscribe() }
    }

    /// Raise the flag. Later calls are no-ops.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            tracing::debug!("Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Tasks still holding a [`ShutdownSignal`].
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`], owned by one task.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once the flag is raised, at once if it already was.
    /// Cancel-safe, so it can sit in a `select!` loop.
    pub async fn triggered(&mut self) {
        // Err means every Shutdown handle is gone; nobody is left to wait on.
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }
}
