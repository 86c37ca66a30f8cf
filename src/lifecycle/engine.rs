//! The lifecycle engine driving one draft from build to send.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::client::{SendRequest, TransactionClient, TxKind};
use crate::consolidation::{build_consolidation, send_sweep, summarize_consolidation};
use crate::draft::{Draft, DraftKind};
use crate::error::{Result, TxError};
use crate::lifecycle::dispatch::handler_for;
use crate::lifecycle::guard::InFlight;
use crate::lifecycle::state::{BuildResult, LifecycleState, SendOutcome, Stage};
use crate::observability::metrics;
use crate::wallet::{AddressBook, PasswordGate};

fn tx_kind_for(kind: DraftKind) -> TxKind {
    match kind {
        DraftKind::Transfer => TxKind::Transfer,
        DraftKind::DeployContract => TxKind::DeployContract,
        DraftKind::CallContract => TxKind::CallContract,
    }
}

/// One lifecycle run. A new user action creates a new engine.
pub struct TxEngine {
    client: Arc<dyn TransactionClient>,
    addresses: AddressBook,
    password_gate: Option<Arc<dyn PasswordGate>>,
    run_id: Uuid,
    draft: Mutex<Draft>,
    state: Mutex<LifecycleState>,
    in_flight: InFlight,
}

impl TxEngine {
    pub fn new(client: Arc<dyn TransactionClient>, addresses: AddressBook, draft: Draft) -> Self {
        let run_id = Uuid::new_v4();
        tracing::debug!(run_id = %run_id, kind = %draft.kind(), from = %draft.source().hash, "Lifecycle started");
        Self {
            client,
            addresses,
            password_gate: None,
            run_id,
            draft: Mutex::new(draft),
            state: Mutex::new(LifecycleState::new()),
            in_flight: InFlight::new(),
        }
    }

    /// Require the password gate between confirmation and send.
    pub fn with_password_gate(mut self, gate: Arc<dyn PasswordGate>) -> Self {
        self.password_gate = Some(gate);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LifecycleState {
        self.lock_state().clone()
    }

    pub fn draft(&self) -> Draft {
        lock(&self.draft).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Replace the draft while building (after a cancel, for instance).
    /// The source address cannot change within a run, and a build in
    /// flight keeps the draft it started with.
    pub fn edit_draft(&self, draft: Draft) -> Result<()> {
        let _guard = self.in_flight.try_acquire()?;
        self.lock_state().ensure_editable()?;
        let mut current = lock(&self.draft);
        if current.source().hash != draft.source().hash {
            return Err(TxError::Validation(
                "The source address cannot change during a transaction".to_string(),
            ));
        }
        *current = draft;
        Ok(())
    }

    /// Run the build and check steps.
    ///
    /// Once consolidation has been flagged, this builds the sweep-to-self
    /// whatever the draft says.
    pub async fn build(&self) -> Result<LifecycleState> {
        let _guard = self.in_flight.try_acquire()?;
        let snapshot = self.state();
        snapshot.ensure_can_build()?;
        let draft = self.draft();

        if snapshot.consolidation_required {
            return self.build_consolidation_sweep(&draft).await;
        }

        let handler = handler_for(draft.kind());
        match (handler.build)(self.client.as_ref(), &draft).await {
            Ok(build) => {
                let summary = (handler.check)(&draft, &build);
                metrics::record_build(draft.kind().as_str(), "ok");
                tracing::info!(
                    run_id = %self.run_id,
                    kind = %draft.kind(),
                    sweep = build.is_sweep(),
                    fee = %build.fee(),
                    "Transaction built"
                );
                self.transition(|s| s.built(draft.clone(), build, summary))
            }
            Err(TxError::ConsolidationRequired(detail)) if draft.kind() == DraftKind::Transfer => {
                metrics::record_build(draft.kind().as_str(), "consolidation_required");
                tracing::warn!(
                    run_id = %self.run_id,
                    address = %draft.source().hash,
                    "Address needs consolidation before it can send"
                );
                self.transition(|s| s.consolidation_needed(&detail))
            }
            Err(e) => Err(self.fail_build(draft.kind(), e)),
        }
    }

    /// Accept the consolidation overlay and build the sweep-to-self.
    pub async fn confirm_consolidation(&self) -> Result<LifecycleState> {
        let _guard = self.in_flight.try_acquire()?;
        self.transition(LifecycleState::consolidation_accepted)?;
        let draft = self.draft();
        self.build_consolidation_sweep(&draft).await
    }

    /// Close the consolidation overlay. The next build still consolidates.
    pub fn dismiss_consolidation(&self) -> Result<LifecycleState> {
        self.transition(LifecycleState::consolidation_dismissed)
    }

    /// Confirm the reviewed transaction. Sends immediately unless a password
    /// gate is configured.
    pub async fn confirm(&self) -> Result<LifecycleState> {
        let _guard = self.in_flight.try_acquire()?;
        let state = self.transition(|s| s.confirmed(self.password_gate.is_some()))?;
        if state.stage == Stage::Sending {
            return self.send().await;
        }
        Ok(state)
    }

    /// Return to `Building` so the draft can be edited.
    pub fn cancel(&self) -> Result<LifecycleState> {
        let state = self.transition(LifecycleState::cancelled)?;
        tracing::debug!(run_id = %self.run_id, "Confirmation cancelled");
        Ok(state)
    }

    /// Unlock with `password` and send. A wrong password leaves the stage
    /// unchanged and returns `TxError::InvalidPassword`.
    pub async fn submit_password(&self, password: &str) -> Result<LifecycleState> {
        let _guard = self.in_flight.try_acquire()?;
        let snapshot = self.state();
        let gate = match (&self.password_gate, snapshot.stage) {
            (Some(gate), Stage::AwaitingPassword) => gate.clone(),
            _ => {
                return Err(TxError::InvalidTransition {
                    stage: snapshot.stage.to_string(),
                    action: "unlock",
                })
            }
        };

        if !gate.verify(password).await? {
            tracing::debug!(run_id = %self.run_id, "Password rejected");
            self.transition(LifecycleState::password_rejected)?;
            return Err(TxError::InvalidPassword);
        }

        self.transition(LifecycleState::unlocked)?;
        self.send().await
    }

    async fn build_consolidation_sweep(&self, draft: &Draft) -> Result<LifecycleState> {
        let source = draft.source();
        match build_consolidation(self.client.as_ref(), source).await {
            Ok(sweep) => {
                let summary = summarize_consolidation(source, &sweep);
                metrics::record_build("consolidation", "ok");
                tracing::info!(
                    run_id = %self.run_id,
                    address = %source.hash,
                    transactions = sweep.transactions.len(),
                    fee = %sweep.total_fee,
                    "Consolidation built"
                );
                self.transition(|s| s.built(draft.clone(), BuildResult::Sweep(sweep), summary))
            }
            Err(e) => Err(self.fail_build(DraftKind::Transfer, e)),
        }
    }

    /// Record a terminal build failure and hand the error back.
    fn fail_build(&self, kind: DraftKind, error: TxError) -> TxError {
        metrics::record_build(kind.as_str(), error.label());
        tracing::warn!(run_id = %self.run_id, kind = %kind, error = %error, "Build failed");
        let mut state = self.lock_state();
        *state = state.clone().build_failed(&error);
        error
    }

    /// Sending → Sent | Failed. Caller holds the in-flight guard.
    async fn send(&self) -> Result<LifecycleState> {
        let snapshot = self.state();
        let (build, draft) = match (snapshot.build.clone(), snapshot.built_from.clone()) {
            (Some(build), Some(draft)) if snapshot.stage == Stage::Sending => (build, draft),
            _ => {
                return Err(TxError::InvalidTransition {
                    stage: snapshot.stage.to_string(),
                    action: "send",
                })
            }
        };
        let source = draft.source().clone();

        let result = match &build {
            BuildResult::Single(tx) => {
                let kind = tx_kind_for(draft.kind());
                let request = SendRequest {
                    source: &source,
                    tx_id: &tx.tx_id,
                    unsigned_tx: &tx.unsigned_tx,
                    destination: draft.destination(),
                    kind,
                    amount: snapshot.summary.as_ref().map(|s| s.amount),
                };
                self.client
                    .sign_and_send(request)
                    .await
                    .map(|sent| SendOutcome {
                        kind,
                        transactions: vec![sent],
                        contract_address: tx.contract_address.clone(),
                    })
                    .map_err(TxError::from)
            }
            BuildResult::Sweep(sweep) => {
                let (destination, kind) = if snapshot.consolidation_required {
                    (source.hash.as_str(), TxKind::Consolidation)
                } else {
                    (draft.destination().unwrap_or(source.hash.as_str()), TxKind::Sweep)
                };
                send_sweep(self.client.as_ref(), &source, sweep, destination, kind)
                    .await
                    .map(|transactions| SendOutcome {
                        kind,
                        transactions,
                        contract_address: None,
                    })
                    .map_err(TxError::PartialSweep)
            }
        };

        match result {
            Ok(outcome) => {
                metrics::record_send(outcome.kind.as_str(), "ok");
                tracing::info!(
                    run_id = %self.run_id,
                    kind = %outcome.kind,
                    transactions = outcome.transactions.len(),
                    "{}",
                    outcome.message()
                );
                let state = self.transition(|s| s.sent(outcome))?;
                if let Err(e) = self.addresses.refresh_balance(self.client.as_ref(), &source.hash).await {
                    tracing::warn!(run_id = %self.run_id, address = %source.hash, error = %e, "Balance refresh after send failed");
                }
                Ok(state)
            }
            Err(e) => {
                metrics::record_send(tx_kind_label(&build, &draft, snapshot.consolidation_required), e.label());
                tracing::warn!(run_id = %self.run_id, error = %e, "Send failed");
                self.transition(|s| s.send_failed(&e))?;
                Err(e)
            }
        }
    }

    fn transition(&self, f: impl FnOnce(LifecycleState) -> Result<LifecycleState>) -> Result<LifecycleState> {
        let mut state = self.lock_state();
        let next = f(state.clone())?;
        *state = next.clone();
        Ok(next)
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        lock(&self.state)
    }
}

fn tx_kind_label(build: &BuildResult, draft: &Draft, consolidating: bool) -> &'static str {
    match build {
        BuildResult::Sweep(_) if consolidating => TxKind::Consolidation.as_str(),
        BuildResult::Sweep(_) => TxKind::Sweep.as_str(),
        BuildResult::Single(_) => tx_kind_for(draft.kind()).as_str(),
    }
}

/// State updates never panic mid-write, so a poisoned lock still holds a
/// consistent value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
