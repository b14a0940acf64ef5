//! Error types for pledge-pipeline

use pledge_ipfs::StoreError;
use pledge_ledger::LedgerError;
use thiserror::Error;

use crate::revert::classify_revert;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Upload failed: {0}")]
    Upload(#[source] StoreError),

    #[error("Preparation failed: {0}")]
    Preparation(String),

    #[error("Submission failed: {0}")]
    Submission(#[source] LedgerError),

    #[error("Transaction failed: {0}")]
    Confirmation(String),

    #[error("Submission cancelled")]
    Cancelled,
}

/// Coarse error class, for callers that branch on where things went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Upload,
    Preparation,
    Submission,
    Confirmation,
    Cancelled,
}

impl PipelineError {
    pub(crate) fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Upload(other),
        }
    }

    /// `prepare` only fails hard on transport problems; those still count as
    /// a failed preparation.
    pub(crate) fn from_prepare(error: LedgerError) -> Self {
        match error {
            LedgerError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Preparation(other.to_string()),
        }
    }

    pub(crate) fn from_invoke(error: LedgerError) -> Self {
        match error {
            LedgerError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Submission(other),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Upload(_) => ErrorKind::Upload,
            PipelineError::Preparation(_) => ErrorKind::Preparation,
            PipelineError::Submission(_) => ErrorKind::Submission,
            PipelineError::Confirmation(_) => ErrorKind::Confirmation,
            PipelineError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Text for the error toast
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Upload(StoreError::TooLarge { limit, .. }) => {
                format!("File must be smaller than {} MB.", limit / (1024 * 1024))
            }
            PipelineError::Upload(e) => format!("Upload failed: {}", classify_revert(&e.to_string())),
            PipelineError::Preparation(reason) => classify_revert(reason),
            PipelineError::Submission(LedgerError::Rejected(_)) => "Transaction rejected in wallet.".to_string(),
            PipelineError::Submission(e) => classify_revert(&e.to_string()),
            PipelineError::Confirmation(reason) => classify_revert(reason),
            PipelineError::Cancelled => "Submission cancelled.".to_string(),
        }
    }
}
