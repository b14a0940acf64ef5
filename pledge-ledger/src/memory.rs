//! Scripted in-process ledger
//!
//! Simulation, submission and confirmation outcomes are set up front; every
//! call is counted so tests can assert on what the pipeline did.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::Stream;
use pledge_types::{ChainContext, ChainId, ConfirmationResult, ResolvedCall, TransactionHandle};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::{ConfirmationTracker, LedgerError, LedgerWriter, PreparedCall, Result};

#[derive(Debug, Default)]
struct Script {
    revert: Option<String>,
    reject: Option<String>,
    outcome: Option<ConfirmationResult>,
    pending_polls: usize,
}

pub struct MemoryLedger {
    connected: ChainId,
    script: Mutex<Script>,
    prepared: Mutex<Vec<ResolvedCall>>,
    prepare_calls: AtomicUsize,
    invoke_calls: AtomicUsize,
    track_calls: AtomicUsize,
}

impl MemoryLedger {
    /// A ledger whose wallet is connected to `connected`
    pub fn new(connected: ChainId) -> Self {
        Self {
            connected,
            script: Mutex::new(Script::default()),
            prepared: Mutex::new(Vec::new()),
            prepare_calls: AtomicUsize::new(0),
            invoke_calls: AtomicUsize::new(0),
            track_calls: AtomicUsize::new(0),
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulations fail with this revert message
    pub fn revert_with(&self, reason: impl Into<String>) {
        self.script().revert = Some(reason.into());
    }

    /// The signer declines every submission
    pub fn reject_with(&self, reason: impl Into<String>) {
        self.script().reject = Some(reason.into());
    }

    /// Transactions end in `outcome` after `pending_polls` pending reports.
    /// `Pending` as the outcome makes the tracker stop without a verdict.
    pub fn confirm_with(&self, outcome: ConfirmationResult, pending_polls: usize) {
        let mut script = self.script();
        script.outcome = Some(outcome);
        script.pending_polls = pending_polls;
    }

    pub fn prepare_calls(&self) -> usize {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    pub fn invoke_calls(&self) -> usize {
        self.invoke_calls.load(Ordering::SeqCst)
    }

    pub fn track_calls(&self) -> usize {
        self.track_calls.load(Ordering::SeqCst)
    }

    /// Every call passed to `prepare`, in order
    pub fn prepared_calls(&self) -> Vec<ResolvedCall> {
        self.prepared.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn tx_hash(call: &ResolvedCall, nonce: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(call.contract.as_bytes());
        hasher.update(call.function.as_bytes());
        hasher.update(nonce.to_le_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

impl LedgerWriter for MemoryLedger {
    async fn prepare(
        &self,
        call: ResolvedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> Result<PreparedCall> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }

        self.prepared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.clone());

        if context.account.is_none() {
            return Ok(PreparedCall::invalid(call, "no wallet account connected"));
        }
        if call.chain != self.connected || context.chain != self.connected {
            let reason = format!(
                "wrong network: wallet on {}, expected {}",
                self.connected.display_name(),
                call.chain.display_name()
            );
            return Ok(PreparedCall::invalid(call, reason));
        }

        let revert = self.script().revert.clone();
        match revert {
            Some(reason) => Ok(PreparedCall::invalid(call, reason)),
            None => Ok(PreparedCall::valid(call)),
        }
    }

    async fn invoke(
        &self,
        prepared: PreparedCall,
        _context: &ChainContext,
        cancel: &CancellationToken,
    ) -> Result<TransactionHandle> {
        let nonce = self.invoke_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }
        if let Some(reason) = prepared.reason() {
            return Err(LedgerError::InvalidCall(reason.to_string()));
        }

        let reject = self.script().reject.clone();
        if let Some(reason) = reject {
            return Err(LedgerError::Rejected(reason));
        }

        let call = prepared.call();
        let hash = Self::tx_hash(call, nonce);
        tracing::debug!("Memory ledger accepted {} as {}", call.function, hash);

        Ok(TransactionHandle {
            hash,
            chain: call.chain.clone(),
        })
    }
}

impl ConfirmationTracker for MemoryLedger {
    fn track(
        &self,
        _handle: &TransactionHandle,
        cancel: &CancellationToken,
    ) -> impl Stream<Item = ConfirmationResult> + Send {
        self.track_calls.fetch_add(1, Ordering::SeqCst);

        let (outcome, pending_polls) = {
            let script = self.script();
            (
                script.outcome.clone().unwrap_or(ConfirmationResult::Success),
                script.pending_polls,
            )
        };

        let mut items = vec![ConfirmationResult::Pending; pending_polls];
        if outcome.is_terminal() {
            items.push(outcome);
        }
        if cancel.is_cancelled() {
            items.clear();
        }

        futures::stream::iter(items)
    }
}
