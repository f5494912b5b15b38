//! Locally registered action callbacks
//!
//! The converse service names an action; the client looks it up here and
//! runs it. `send` is reserved for delivering bot messages to the user.

use crate::converse::{Context, Entities};
use crate::error::WitError;
use async_trait::async_trait;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Validated action name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionName(String);

impl ActionName {
    /// Name of the outbound message action
    pub const SEND: &'static str = "send";

    pub fn new(name: impl Into<String>) -> Result<Self, WitError> {
        let name = name.into();
        if name.is_empty() {
            return Err(WitError::Configuration("action name must not be empty".to_string()));
        }
        if name.trim() != name {
            return Err(WitError::Configuration(format!(
                "action name {name:?} has surrounding whitespace"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ActionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything an action sees about the step that triggered it
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub session_id: String,
    pub context: Context,
    /// The user's utterance; only set on the first step of a turn
    pub message: Option<String>,
    pub entities: Option<Entities>,
}

/// Bot message handed to the `send` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub quick_replies: Vec<String>,
}

/// Failure reported by an action callback
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A side-effecting callback the converse service can trigger
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action.
    ///
    /// `reply` is only set for `send`. Returning `Ok(None)` from a custom
    /// action resets the conversation context to empty.
    async fn run(
        &self,
        request: ActionRequest,
        reply: Option<&BotReply>,
    ) -> Result<Option<Context>, ActionError>;
}

#[async_trait]
impl<T: Action + ?Sized> Action for Arc<T> {
    async fn run(
        &self,
        request: ActionRequest,
        reply: Option<&BotReply>,
    ) -> Result<Option<Context>, ActionError> {
        (**self).run(request, reply).await
    }
}

/// Adapter for plain synchronous closures
pub struct FnAction<F>(F);

impl<F> FnAction<F>
where
    F: Fn(ActionRequest, Option<&BotReply>) -> Result<Option<Context>, ActionError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn(ActionRequest, Option<&BotReply>) -> Result<Option<Context>, ActionError> + Send + Sync,
{
    async fn run(
        &self,
        request: ActionRequest,
        reply: Option<&BotReply>,
    ) -> Result<Option<Context>, ActionError> {
        (self.0)(request, reply)
    }
}

/// Dispatch table from action name to callback
#[derive(Clone)]
pub struct ActionTable {
    actions: HashMap<ActionName, Arc<dyn Action>>,
}

impl ActionTable {
    pub fn builder() -> ActionTableBuilder {
        ActionTableBuilder::default()
    }

    /// Build from already-validated names. Later duplicates replace earlier ones.
    pub fn new(actions: impl IntoIterator<Item = (ActionName, Arc<dyn Action>)>) -> Self {
        let actions: HashMap<_, _> = actions.into_iter().collect();
        if !actions.contains_key(ActionName::SEND) {
            tracing::warn!("The 'send' action is missing");
        }
        Self { actions }
    }

    /// Look up an action, failing the turn if it isn't registered
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Action>, WitError> {
        self.actions
            .get(name)
            .ok_or_else(|| WitError::MissingAction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.actions.keys().map(ActionName::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.names())
            .finish()
    }
}

/// Collects named actions and validates them into an [`ActionTable`]
#[derive(Default)]
pub struct ActionTableBuilder {
    actions: Vec<(String, Arc<dyn Action>)>,
}

impl ActionTableBuilder {
    #[must_use]
    pub fn action(mut self, name: impl Into<String>, action: impl Action + 'static) -> Self {
        self.actions.push((name.into(), Arc::new(action)));
        self
    }

    #[must_use]
    pub fn function<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ActionRequest, Option<&BotReply>) -> Result<Option<Context>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.action(name, FnAction::new(f))
    }

    /// Fails on invalid or duplicate names. A missing `send` only warns.
    pub fn build(self) -> Result<ActionTable, WitError> {
        let mut validated: Vec<(ActionName, Arc<dyn Action>)> = Vec::with_capacity(self.actions.len());
        for (name, action) in self.actions {
            let name = ActionName::new(name)?;
            if validated.iter().any(|(existing, _)| *existing == name) {
                return Err(WitError::Configuration(format!(
                    "action {name} registered twice"
                )));
            }
            validated.push((name, action));
        }
        Ok(ActionTable::new(validated))
    }
}
