//! Mock implementations for testing
//!
//! Queued converse responses, a gate for interleaving overlapping turns,
//! and actions that record what they were called with.

#![allow(dead_code)]

use crate::actions::{Action, ActionError, ActionRequest, BotReply};
use crate::converse::{Context, ConverseClient, ConverseError, ConverseResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Converse Client
// ============================================================================

/// One `converse` call as seen by a mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub session_id: String,
    pub message: Option<String>,
    pub context: Context,
}

/// Converse client that returns queued responses in order
#[derive(Default)]
pub struct MockConverseClient {
    responses: Mutex<VecDeque<Result<ConverseResponse, ConverseError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockConverseClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = ConverseResponse>) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.queue_response(response);
        }
        mock
    }

    pub fn queue_response(&self, response: ConverseResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: ConverseError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ConverseClient for MockConverseClient {
    async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: &Context,
    ) -> Result<ConverseResponse, ConverseError> {
        self.calls.lock().unwrap().push(RecordedCall {
            session_id: session_id.to_string(),
            message: message.map(str::to_string),
            context: context.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ConverseError::network("No mock response queued")))
    }
}

// ============================================================================
// Gated Converse Client (for preemption testing)
// ============================================================================

/// Holds the first `converse` call until the test releases it.
///
/// The gated call takes its response from the queue only after release, so
/// responses for calls made in the meantime are queued first.
pub struct GatedConverseClient {
    inner: MockConverseClient,
    gate_armed: AtomicBool,
    /// Notified when the gated call has started
    pub started: Arc<Notify>,
    /// Notify to let the gated call proceed
    pub release: Arc<Notify>,
}

impl GatedConverseClient {
    pub fn new(inner: MockConverseClient) -> Self {
        Self {
            inner,
            gate_armed: AtomicBool::new(true),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn inner(&self) -> &MockConverseClient {
        &self.inner
    }
}

#[async_trait]
impl ConverseClient for GatedConverseClient {
    async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: &Context,
    ) -> Result<ConverseResponse, ConverseError> {
        if self.gate_armed.swap(false, Ordering::SeqCst) {
            self.started.notify_one();
            self.release.notified().await;
        }
        self.inner.converse(session_id, message, context).await
    }
}

// ============================================================================
// Recording Actions
// ============================================================================

/// What a recording action returns
#[derive(Debug, Clone)]
pub enum Returns {
    /// Hand back the request context unchanged
    Unchanged,
    /// Merge these keys into the request context
    Merge(Context),
    /// Return `None`
    Nothing,
    Fail(String),
}

/// Action that records every invocation
pub struct RecordingAction {
    returns: Returns,
    invocations: Mutex<Vec<(ActionRequest, Option<BotReply>)>>,
}

impl RecordingAction {
    pub fn new(returns: Returns) -> Arc<Self> {
        Arc::new(Self {
            returns,
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn unchanged() -> Arc<Self> {
        Self::new(Returns::Unchanged)
    }

    pub fn invocations(&self) -> Vec<(ActionRequest, Option<BotReply>)> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

#[async_trait]
impl Action for RecordingAction {
    async fn run(
        &self,
        request: ActionRequest,
        reply: Option<&BotReply>,
    ) -> Result<Option<Context>, ActionError> {
        self.invocations
            .lock()
            .unwrap()
            .push((request.clone(), reply.cloned()));

        match &self.returns {
            Returns::Unchanged => Ok(Some(request.context)),
            Returns::Merge(extra) => {
                let mut ctx = request.context;
                for (k, v) in extra.as_map() {
                    ctx.insert(k.clone(), v.clone());
                }
                Ok(Some(ctx))
            }
            Returns::Nothing => Ok(None),
            Returns::Fail(message) => Err(ActionError::new(message.clone())),
        }
    }
}

pub fn context_from(value: serde_json::Value) -> Context {
    serde_json::from_value(value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_converse_client() {
        let mock = MockConverseClient::with_responses([ConverseResponse::stop()]);

        let resp = mock.converse("s", Some("hi"), &Context::new()).await.unwrap();
        assert_eq!(resp.kind.as_deref(), Some("stop"));

        // Second call should fail (no more responses)
        assert!(mock.converse("s", None, &Context::new()).await.is_err());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_recording_action_merges() {
        let action = RecordingAction::new(Returns::Merge(context_from(serde_json::json!({"b": 2}))));
        let request = ActionRequest {
            session_id: "s".to_string(),
            context: context_from(serde_json::json!({"a": 1})),
            message: None,
            entities: None,
        };

        let ctx = action.run(request, None).await.unwrap().unwrap();
        assert_eq!(ctx, context_from(serde_json::json!({"a": 1, "b": 2})));
        assert_eq!(action.call_count(), 1);
    }
}
