//! Per-kind build and check steps, keyed by [`DraftKind`].

use futures_util::future::BoxFuture;

use crate::amount::expected_amount_after_fees;
use crate::client::TransactionClient;
use crate::draft::{validate_draft, Draft, DraftKind};
use crate::error::{Result, TxError};
use crate::lifecycle::check::{CheckSummary, Purpose};
use crate::lifecycle::state::BuildResult;

/// Validates the draft and asks the client for unsigned transaction(s).
pub type BuildFn = for<'a> fn(&'a dyn TransactionClient, &'a Draft) -> BoxFuture<'a, Result<BuildResult>>;

/// Derives the confirmation summary from a draft and its build.
pub type CheckFn = fn(&Draft, &BuildResult) -> CheckSummary;

/// Build and check steps for one transaction kind.
pub struct KindHandler {
    pub kind: DraftKind,
    pub build: BuildFn,
    pub check: CheckFn,
}

static HANDLERS: [KindHandler; 3] = [
    KindHandler {
        kind: DraftKind::Transfer,
        build: build_transfer,
        check: check_transfer,
    },
    KindHandler {
        kind: DraftKind::DeployContract,
        build: build_deploy,
        check: check_contract,
    },
    KindHandler {
        kind: DraftKind::CallContract,
        build: build_call,
        check: check_contract,
    },
];

/// Handler registered for `kind`.
pub fn handler_for(kind: DraftKind) -> &'static KindHandler {
    match kind {
        DraftKind::Transfer => &HANDLERS[0],
        DraftKind::DeployContract => &HANDLERS[1],
        DraftKind::CallContract => &HANDLERS[2],
    }
}

fn mismatch(expected: DraftKind, draft: &Draft) -> TxError {
    TxError::Validation(format!("Expected a {} draft, got {}", expected, draft.kind()))
}

fn build_transfer<'a>(client: &'a dyn TransactionClient, draft: &'a Draft) -> BoxFuture<'a, Result<BuildResult>> {
    Box::pin(async move {
        let Draft::Transfer(transfer) = draft else {
            return Err(mismatch(DraftKind::Transfer, draft));
        };
        validate_draft(draft)?;
        if transfer.is_sweep() {
            let sweep = client.build_sweep(&transfer.source, &transfer.destination).await?;
            return Ok(BuildResult::Sweep(sweep));
        }
        let built = client
            .build_transfer(&transfer.source, &transfer.destination, transfer.amount, &transfer.gas)
            .await?;
        Ok(BuildResult::Single(built))
    })
}

fn build_deploy<'a>(client: &'a dyn TransactionClient, draft: &'a Draft) -> BoxFuture<'a, Result<BuildResult>> {
    Box::pin(async move {
        let Draft::DeployContract(deploy) = draft else {
            return Err(mismatch(DraftKind::DeployContract, draft));
        };
        validate_draft(draft)?;
        Ok(BuildResult::Single(client.build_deploy_contract(deploy).await?))
    })
}

fn build_call<'a>(client: &'a dyn TransactionClient, draft: &'a Draft) -> BoxFuture<'a, Result<BuildResult>> {
    Box::pin(async move {
        let Draft::CallContract(call) = draft else {
            return Err(mismatch(DraftKind::CallContract, draft));
        };
        validate_draft(draft)?;
        Ok(BuildResult::Single(client.build_call_contract(call).await?))
    })
}

fn check_transfer(draft: &Draft, build: &BuildResult) -> CheckSummary {
    let source = draft.source();
    let fee = build.fee();
    CheckSummary {
        kind: DraftKind::Transfer,
        purpose: if build.is_sweep() { Purpose::Sweep } else { Purpose::Single },
        from: source.hash.clone(),
        to: draft.destination().map(str::to_owned),
        amount: expected_amount_after_fees(draft.requested_amount(), fee, source.available_balance),
        fee,
        transaction_count: build.transaction_count(),
        bytecode: None,
        fields: None,
        issue_token_amount: None,
    }
}

fn check_contract(draft: &Draft, build: &BuildResult) -> CheckSummary {
    let (bytecode, fields, issue_token_amount) = match draft {
        Draft::DeployContract(d) => (d.bytecode.clone(), Some(d.initial_fields.clone()), d.issue_token_amount),
        Draft::CallContract(d) => (d.bytecode.clone(), None, None),
        Draft::Transfer(_) => (String::new(), None, None),
    };
    CheckSummary {
        kind: draft.kind(),
        purpose: Purpose::Single,
        from: draft.source().hash.clone(),
        to: None,
        amount: draft.requested_amount(),
        fee: build.fee(),
        transaction_count: build.transaction_count(),
        bytecode: Some(bytecode),
        fields,
        issue_token_amount,
    }
}
