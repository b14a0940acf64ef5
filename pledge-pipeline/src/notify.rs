//! Where terminal results go: the toast sink and the UI callbacks

use crate::error::PipelineError;
use crate::pipeline::SubmissionReceipt;

/// Receives the one user-visible message of each finished submission
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink: the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Terminal callbacks of the component that started the submission.
///
/// The pipeline only keeps a `Weak` reference, so a consumer that went away
/// before the result arrived is simply skipped.
pub trait SubmissionObserver: Send + Sync {
    fn on_success(&self, receipt: &SubmissionReceipt);
    fn on_error(&self, error: &PipelineError);
}
