//! Converse service abstraction
//!
//! One request, one decision. Transport, auth and encoding live behind
//! [`ConverseClient`]; the action loop only sees the trait.

mod error;
mod http;
mod types;

pub use error::{ConverseError, ConverseErrorKind};
pub use http::WitClient;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for converse backends
#[async_trait]
pub trait ConverseClient: Send + Sync {
    /// Ask the service what to do next for `session_id`.
    ///
    /// `message` is the literal user utterance on the first step of a turn
    /// and `None` afterwards.
    async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: &Context,
    ) -> Result<ConverseResponse, ConverseError>;
}

#[async_trait]
impl<T: ConverseClient + ?Sized> ConverseClient for Arc<T> {
    async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: &Context,
    ) -> Result<ConverseResponse, ConverseError> {
        (**self).converse(session_id, message, context).await
    }
}

/// Logging wrapper for converse clients
pub struct LoggingClient<C> {
    inner: C,
}

impl<C: ConverseClient> LoggingClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ConverseClient> ConverseClient for LoggingClient<C> {
    async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: &Context,
    ) -> Result<ConverseResponse, ConverseError> {
        let start = std::time::Instant::now();
        let result = self.inner.converse(session_id, message, context).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    session_id,
                    duration_ms = %duration.as_millis(),
                    has_message = message.is_some(),
                    decision = response.kind.as_deref().unwrap_or("<none>"),
                    confidence = ?response.confidence,
                    "Converse request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Converse request failed"
                );
            }
        }

        result
    }
}
