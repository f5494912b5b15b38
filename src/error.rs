//! Errors surfaced by the action loop and its entry points

use crate::converse::{ConverseError, MalformedDecision};
use thiserror::Error;

/// Why a turn failed. Preemption is not represented here: a superseded
/// turn returns its partial response as `Ok`.
#[derive(Debug, Error)]
pub enum WitError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Max steps reached, stopping (budget was {max_steps})")]
    StepBudgetExceeded { max_steps: u32 },

    #[error("Malformed decision: {0}")]
    MalformedDecision(#[from] MalformedDecision),

    #[error("Remote service reported an error decision")]
    RemoteError,

    #[error("Unknown action {0}")]
    MissingAction(String),

    #[error("Action {action} failed: {message}")]
    ActionFailed { action: String, message: String },

    #[error("Converse request failed: {0}")]
    Converse(#[from] ConverseError),

    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl WitError {
    pub fn must_have_actions() -> Self {
        WitError::Configuration(
            "You must provide an action table to be able to use run_actions. \
             Learn more at https://wit.ai/docs/quickstart"
                .to_string(),
        )
    }

    /// Short stable label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            WitError::Configuration(_) => "configuration",
            WitError::StepBudgetExceeded { .. } => "step_budget_exceeded",
            WitError::MalformedDecision(_) => "malformed_decision",
            WitError::RemoteError => "remote_error",
            WitError::MissingAction(_) => "missing_action",
            WitError::ActionFailed { .. } => "action_failed",
            WitError::Converse(_) => "converse",
            WitError::Io(_) => "io",
        }
    }
}
