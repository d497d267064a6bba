//! Outcome classification for claude CLI calls
//!
//! The CLI has no structured status for "nothing to do", so a failed call
//! whose output says the item is already in the desired state counts as a
//! successful no-op. All phrase matching lives here.

use super::{ExecError, ExecResult};

/// Phrases meaning the requested state already holds
const NO_OP_PHRASES: [&str; 4] = [
    "already installed",
    "not found",
    "not installed",
    "already uninstalled",
];

/// Classified result of one external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and changed something
    Success,
    /// The item was already in the requested state
    AlreadyDone,
    /// The command failed; carries a printable reason
    Failed(String),
}

impl Outcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Classify a captured-output invocation result
#[must_use]
pub fn classify_outcome(result: &ExecResult<String>) -> Outcome {
    match result {
        Ok(_) => Outcome::Success,
        Err(err @ ExecError::Failed { output, .. }) => {
            if is_no_op(output) {
                Outcome::AlreadyDone
            } else {
                Outcome::Failed(err.to_string())
            }
        }
        Err(err) => Outcome::Failed(err.to_string()),
    }
}

fn is_no_op(output: &str) -> bool {
    let lower = output.to_lowercase();
    NO_OP_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
