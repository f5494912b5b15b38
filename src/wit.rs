//! High-level client
//!
//! Bundles a converse client, an optional action table and the session
//! registry behind the entry points applications call.

use crate::action_loop::{ActionLoop, BotResponse};
use crate::actions::ActionTable;
use crate::config::{WitConfig, DEFAULT_SESSION_ID};
use crate::converse::{
    Context, ConverseClient, ConverseResponse, LoggingClient, MessageResponse, WitClient,
};
use crate::error::WitError;
use crate::interactive::{run_console, ConsoleOptions};
use crate::session::{EpochRegistry, SessionRegistry};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

/// Converse client with action dispatch
pub struct Wit<C, R = EpochRegistry> {
    client: C,
    actions: Option<ActionTable>,
    registry: Arc<R>,
    session_id: String,
}

impl<C: ConverseClient> Wit<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            actions: None,
            registry: Arc::new(EpochRegistry::new()),
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }
}

impl Wit<LoggingClient<WitClient>> {
    /// HTTP client for the configured Wit app. Requires an access token.
    pub fn from_config(config: &WitConfig) -> Result<Self, WitError> {
        if !config.has_access_token() {
            return Err(WitError::Configuration(
                "WIT_ACCESS_TOKEN is not set".to_string(),
            ));
        }
        let client = LoggingClient::new(WitClient::new(config)?);
        Ok(Wit::new(client).with_session_id(config.session_id.clone()))
    }

    /// Intent and entities for one utterance. Needs no action table.
    pub async fn message(&self, text: &str) -> Result<MessageResponse, WitError> {
        Ok(self.client.inner().message(text).await?)
    }

    /// Intent and entities for a recorded utterance
    pub async fn speech(&self, audio: impl AsRef<Path>) -> Result<MessageResponse, WitError> {
        Ok(self.client.inner().speech(audio.as_ref()).await?)
    }
}

impl<C, R> Wit<C, R>
where
    C: ConverseClient,
    R: SessionRegistry,
{
    #[must_use]
    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Share a registry with other clients in the process
    pub fn with_registry<R2: SessionRegistry>(self, registry: Arc<R2>) -> Wit<C, R2> {
        Wit {
            client: self.client,
            actions: self.actions,
            registry,
            session_id: self.session_id,
        }
    }

    /// Session id used by [`Wit::interactive`]
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    fn require_actions(&self) -> Result<&ActionTable, WitError> {
        self.actions.as_ref().ok_or_else(WitError::must_have_actions)
    }

    /// One raw converse round trip, without dispatching anything
    pub async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: Option<&Context>,
    ) -> Result<ConverseResponse, WitError> {
        let empty = Context::new();
        Ok(self
            .client
            .converse(session_id, message, context.unwrap_or(&empty))
            .await?)
    }

    /// Run one turn, dispatching actions until the service stops
    pub async fn run_actions(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: Option<Context>,
        max_steps: u32,
    ) -> Result<BotResponse, WitError> {
        let actions = self.require_actions()?;
        ActionLoop::new(&self.client, actions, &*self.registry)
            .run(session_id, message, context, max_steps)
            .await
    }

    /// Chat on stdin/stdout until end of input
    pub async fn interactive(
        &self,
        context: Option<Context>,
        max_steps: u32,
    ) -> Result<Context, WitError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.interactive_with(stdin, &mut stdout, context, max_steps)
            .await
    }

    /// Chat over arbitrary async I/O until `input` is exhausted
    pub async fn interactive_with<I, O>(
        &self,
        input: I,
        output: &mut O,
        context: Option<Context>,
        max_steps: u32,
    ) -> Result<Context, WitError>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let actions = self.require_actions()?;
        let options = ConsoleOptions {
            session_id: &self.session_id,
            max_steps,
        };
        run_console(
            &self.client,
            actions,
            &*self.registry,
            options,
            context,
            input,
            output,
        )
        .await
    }
}
