//! Pipeline stages and the snapshot the UI renders from

use pledge_types::{ContentReference, TransactionHandle};

/// Where a submission is. Stages only ever move forward within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    AwaitingPreparation,
    Invoking,
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Succeeded | Stage::Failed)
    }

    /// True while adapters are being called
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, Stage::Idle | Stage::Succeeded | Stage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Uploading => "uploading",
            Stage::AwaitingPreparation => "preparing",
            Stage::Invoking => "waiting for signature",
            Stage::AwaitingConfirmation => "confirming",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one pipeline, published on every stage change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionSession {
    pub stage: Stage,
    /// Set once the upload finished
    pub content: Option<ContentReference>,
    /// Set once the transaction was sent
    pub transaction: Option<TransactionHandle>,
    /// User-facing message of the last failure
    pub error: Option<String>,
}
