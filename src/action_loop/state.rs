//! Pure decision handling for one step
//!
//! Maps a validated decision onto the effect the loop must carry out. No
//! I/O happens here.

use crate::actions::BotReply;
use crate::converse::{Decision, DecisionKind};
use crate::error::WitError;

/// Where a turn is after handling a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    EmittedMessage,
    InvokedAction,
    Stopped,
    Failed,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Stopped | LoopState::Failed)
    }
}

/// Work the loop performs for a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// End the turn successfully
    Finish,
    /// Record the message and hand it to `send`
    SendMessage(BotReply),
    /// Run a named custom action and adopt the context it returns
    InvokeAction(String),
}

impl Effect {
    pub fn next_state(&self) -> LoopState {
        match self {
            Effect::Finish => LoopState::Stopped,
            Effect::SendMessage(_) => LoopState::EmittedMessage,
            Effect::InvokeAction(_) => LoopState::InvokedAction,
        }
    }
}

/// Decide what to do with `decision`. Legacy `merge` is normalized first.
pub fn transition(decision: Decision) -> Result<Effect, WitError> {
    match decision.normalized().kind {
        DecisionKind::Error => Err(WitError::RemoteError),
        DecisionKind::Stop => Ok(Effect::Finish),
        DecisionKind::Message {
            text,
            quick_replies,
        } => Ok(Effect::SendMessage(BotReply {
            text,
            quick_replies,
        })),
        DecisionKind::Action { name } => Ok(Effect::InvokeAction(name)),
        // normalized() never yields Merge
        DecisionKind::Merge => Ok(Effect::InvokeAction("merge".to_string())),
    }
}
