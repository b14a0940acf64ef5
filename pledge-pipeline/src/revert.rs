//! Friendly text for contract reverts and wallet errors

/// Longest raw message shown to the user before truncation
pub const MAX_RAW_MESSAGE: usize = 96;

/// Known revert signatures and wallet errors.
/// Format: (case-insensitive needle, user-facing text)
const KNOWN_REVERTS: &[(&str, &str)] = &[
    ("DeadlineTooSoon", "The deadline is too soon. Pick a later date."),
    ("deadline too soon", "The deadline is too soon. Pick a later date."),
    ("NotAuthor", "Only the goal author can do this."),
    ("not author", "Only the goal author can do this."),
    ("AlreadyAccepted", "This motivator has already been accepted."),
    ("already accepted", "This motivator has already been accepted."),
    ("NotMotivator", "That account has not offered to motivate this goal."),
    ("AlreadyWatcher", "You are already watching this goal."),
    ("GoalClosed", "This goal is already closed."),
    ("goal closed", "This goal is already closed."),
    ("GoalNotFound", "Goal not found."),
    ("goal not found", "Goal not found."),
    ("DeadlineNotPassed", "The goal deadline has not passed yet."),
    ("InsufficientStake", "The stake is too small."),
    ("insufficient funds", "Not enough funds to pay for this transaction."),
    ("wrong network", "Wrong network. Switch your wallet to the app's network."),
    ("chain mismatch", "Wrong network. Switch your wallet to the app's network."),
    ("user rejected", "Transaction rejected in wallet."),
    ("user denied", "Transaction rejected in wallet."),
    ("no wallet account", "Connect a wallet first."),
];

/// Map a raw revert or wallet message to text a user can act on.
///
/// Unrecognized messages come back as-is, cut to [`MAX_RAW_MESSAGE`] characters.
pub fn classify_revert(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    for (needle, friendly) in KNOWN_REVERTS {
        if lowered.contains(&needle.to_lowercase()) {
            return friendly.to_string();
        }
    }
    truncate(raw.trim())
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_RAW_MESSAGE {
        return message.to_string();
    }
    let cut: String = message.chars().take(MAX_RAW_MESSAGE).collect();
    format!("{}…", cut.trim_end())
}
