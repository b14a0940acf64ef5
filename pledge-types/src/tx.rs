//! Submitted transactions and their confirmation state

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// A submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub hash: String,
    pub chain: ChainId,
}

/// Observed state of a submitted transaction.
///
/// Success and failure are distinct variants, so a result can never be both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ConfirmationResult {
    Pending,
    Success,
    /// Included but reverted, or reported failed by the network
    Failure(String),
}

impl ConfirmationResult {
    pub fn is_pending(&self) -> bool {
        matches!(self, ConfirmationResult::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConfirmationResult::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ConfirmationResult::Failure(_))
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}
