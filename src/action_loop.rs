//! Bounded action-dispatch loop
//!
//! Drives one turn: ask the converse service what to do, do it, repeat
//! until the service says `stop`, the step budget runs out, or a newer turn
//! for the same session takes over.

mod state;

#[cfg(test)]
mod proptests;

pub use state::{transition, Effect, LoopState};

use crate::actions::{ActionName, ActionRequest, ActionTable};
use crate::converse::{Context, ConverseClient, Entities};
use crate::error::WitError;
use crate::session::{EpochGuard, SessionRegistry};

/// Result of one turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotResponse {
    /// Every `msg` decision's text, in the order received
    pub messages: Vec<String>,
    pub context: Context,
    /// A newer turn for the same session took over before this one finished
    pub preempted: bool,
}

impl BotResponse {
    pub fn new(context: Context) -> Self {
        Self {
            messages: Vec::new(),
            context,
            preempted: false,
        }
    }

    fn preempted(mut self) -> Self {
        self.preempted = true;
        self
    }
}

/// One turn's view of the client, action table and session registry
pub struct ActionLoop<'a, C: ?Sized, R: ?Sized> {
    client: &'a C,
    actions: &'a ActionTable,
    registry: &'a R,
}

impl<'a, C, R> ActionLoop<'a, C, R>
where
    C: ConverseClient + ?Sized,
    R: SessionRegistry + ?Sized,
{
    pub fn new(client: &'a C, actions: &'a ActionTable, registry: &'a R) -> Self {
        Self {
            client,
            actions,
            registry,
        }
    }

    /// Run a turn for `session_id`.
    ///
    /// Only the first converse call carries `message`; later steps are
    /// driven by context alone. A superseded turn returns `Ok` with
    /// `preempted` set and whatever it collected so far.
    pub async fn run(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: Option<Context>,
        max_steps: u32,
    ) -> Result<BotResponse, WitError> {
        let guard = EpochGuard::begin(self.registry, session_id);
        let epoch = guard.epoch();

        let result = self
            .run_steps(&guard, session_id, message, context.unwrap_or_default(), max_steps)
            .await;

        match &result {
            Ok(response) if response.preempted => {
                tracing::info!(
                    session_id,
                    epoch,
                    messages = response.messages.len(),
                    "Turn preempted by a newer turn"
                );
            }
            Ok(response) => {
                tracing::debug!(
                    session_id,
                    epoch,
                    messages = response.messages.len(),
                    "Turn completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id,
                    epoch,
                    state = ?LoopState::Failed,
                    error_kind = e.kind(),
                    error = %e,
                    "Turn failed"
                );
            }
        }

        result
    }

    async fn run_steps(
        &self,
        guard: &EpochGuard<'_, R>,
        session_id: &str,
        message: Option<&str>,
        context: Context,
        max_steps: u32,
    ) -> Result<BotResponse, WitError> {
        let mut response = BotResponse::new(context);
        let mut remaining = max_steps;
        let mut current_message = message;

        loop {
            if remaining == 0 {
                return Err(WitError::StepBudgetExceeded { max_steps });
            }

            let decision = self
                .client
                .converse(session_id, current_message, &response.context)
                .await?
                .into_decision()?;

            if !guard.is_current() {
                return Ok(response.preempted());
            }

            let entities = decision.entities.clone();
            let decision_type = decision.kind.type_name();
            let effect = transition(decision)?;
            tracing::debug!(
                session_id,
                step = max_steps - remaining + 1,
                decision = decision_type,
                state = ?effect.next_state(),
                "Handling decision"
            );

            let request = |context: Context, entities: Option<Entities>| ActionRequest {
                session_id: session_id.to_string(),
                context,
                message: current_message.map(str::to_string),
                entities,
            };

            match effect {
                Effect::Finish => return Ok(response),
                Effect::SendMessage(reply) => {
                    let send = self.actions.get(ActionName::SEND)?;
                    response.messages.push(reply.text.clone());
                    // The service's next decision drives context, not send's return
                    send.run(request(response.context.clone(), entities), Some(&reply))
                        .await
                        .map_err(|e| WitError::ActionFailed {
                            action: ActionName::SEND.to_string(),
                            message: e.to_string(),
                        })?;
                }
                Effect::InvokeAction(name) => {
                    let action = self.actions.get(&name)?;
                    let returned = action
                        .run(request(response.context.clone(), entities), None)
                        .await
                        .map_err(|e| WitError::ActionFailed {
                            action: name.clone(),
                            message: e.to_string(),
                        })?;
                    response.context = returned.unwrap_or_else(|| {
                        tracing::warn!(
                            session_id,
                            action = %name,
                            "Missing context - did you forget to return it?"
                        );
                        Context::new()
                    });
                }
            }

            if !guard.is_current() {
                return Ok(response.preempted());
            }

            current_message = None;
            remaining -= 1;
        }
    }
}
