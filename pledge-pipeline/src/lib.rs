//! Pledge Submission Pipeline
//!
//! Every write action of the goal client runs the same sequence:
//! upload the payload, simulate the contract call, send it once, wait for
//! confirmation, tell the user. [`SubmissionPipeline`] runs that sequence for
//! any content store and ledger; [`actions`] configures it per goal action.
//!
//! # Modules
//!
//! - [`pipeline`] - The orchestrator and its single-flight guard
//! - [`session`] - Stages and the snapshot published to the UI
//! - [`actions`] - Request builders for each goal action
//! - [`notify`] - Notification sink and terminal callbacks
//! - [`revert`] - Friendly text for known contract reverts

pub mod actions;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod revert;
pub mod session;

pub use error::{ErrorKind, PipelineError};
pub use notify::{Notifier, SubmissionObserver, TracingNotifier};
pub use pipeline::{PipelineSettings, SubmissionOutcome, SubmissionPipeline, SubmissionReceipt, SuccessPolicy};
pub use revert::classify_revert;
pub use session::{Stage, SubmissionSession};
