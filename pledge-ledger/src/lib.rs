//! Pledge Ledger Adapters
//!
//! Write side of the contract system: simulate a call, submit it once, and
//! follow the transaction until it is confirmed or reverted. Also hosts the
//! read-only subgraph client.
//!
//! - [`RpcLedger`] speaks JSON-RPC to a signer gateway
//! - [`MemoryLedger`] scripts outcomes in process (tests, offline mode)

mod memory;
mod rpc;
pub mod subgraph;

pub use memory::MemoryLedger;
pub use rpc::{RpcLedger, RpcLedgerConfig};
pub use subgraph::{SubgraphClient, SubgraphError};

use std::future::Future;

use futures::Stream;
use pledge_types::{ChainContext, ConfirmationResult, ResolvedCall, TransactionHandle};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Outcome of simulating a call.
///
/// Not `Clone`: [`LedgerWriter::invoke`] takes it by value, so one prepared
/// call can be sent at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PreparedCall {
    call: ResolvedCall,
    rejection: Option<String>,
}

impl PreparedCall {
    pub fn valid(call: ResolvedCall) -> Self {
        Self { call, rejection: None }
    }

    pub fn invalid(call: ResolvedCall, reason: impl Into<String>) -> Self {
        Self { call, rejection: Some(reason.into()) }
    }

    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// Why the simulation failed, if it did
    pub fn reason(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    pub fn call(&self) -> &ResolvedCall {
        &self.call
    }
}

/// Simulate-then-submit access to the contracts
pub trait LedgerWriter: Send + Sync {
    /// Simulate a call. Wrong network, missing account and predicted reverts
    /// come back as an invalid [`PreparedCall`], not as an error.
    fn prepare(
        &self,
        call: ResolvedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<PreparedCall>> + Send;

    /// Sign and send a prepared call
    fn invoke(
        &self,
        prepared: PreparedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<TransactionHandle>> + Send;
}

/// Follows a submitted transaction
pub trait ConfirmationTracker: Send + Sync {
    /// Yields `Pending` any number of times, then one terminal result, then ends.
    /// Cancellation ends the stream early.
    fn track(
        &self,
        handle: &TransactionHandle,
        cancel: &CancellationToken,
    ) -> impl Stream<Item = ConfirmationResult> + Send;
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Rejected by signer: {0}")]
    Rejected(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Refusing to send invalid call: {0}")]
    InvalidCall(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
