//! Terminal rendering of pipeline progress

use pledge_pipeline::{Notifier, Stage, SubmissionOutcome, SubmissionSession};

/// Prints the final toast of a submission
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

/// One progress line for a session snapshot, or `None` when there is
/// nothing new to say (idle, or a terminal stage the notifier reports)
pub fn stage_line(session: &SubmissionSession) -> Option<String> {
    match session.stage {
        Stage::Idle | Stage::Succeeded | Stage::Failed => None,
        Stage::Uploading => Some("Uploading payload...".to_string()),
        Stage::AwaitingPreparation => Some(match &session.content {
            Some(content) => format!("Stored at {}; simulating call...", content),
            None => "Simulating call...".to_string(),
        }),
        Stage::Invoking => Some("Waiting for signature...".to_string()),
        Stage::AwaitingConfirmation => Some(match &session.transaction {
            Some(tx) => format!("Sent {} on {}; waiting for confirmation...", tx.hash, tx.chain.display_name()),
            None => "Waiting for confirmation...".to_string(),
        }),
    }
}

/// Lines to print after a submission ended, and whether it succeeded.
/// Failures add nothing: the notifier already showed the one message.
pub fn outcome_report(outcome: &SubmissionOutcome) -> (Vec<String>, bool) {
    match outcome {
        SubmissionOutcome::Succeeded(receipt) => {
            let mut lines = Vec::new();
            if let Some(content) = &receipt.content {
                lines.push(format!("Content: {}", content));
            }
            lines.push(format!("Transaction: {}", receipt.transaction.hash));
            (lines, true)
        }
        SubmissionOutcome::Failed(_) => (Vec::new(), false),
        SubmissionOutcome::Ignored => (vec!["Another submission is already running".to_string()], false),
    }
}
