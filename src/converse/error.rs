//! Failures talking to the Wit.ai HTTP API

use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Longest excerpt of a response body kept in an error message
const BODY_SNIPPET_CHARS: usize = 200;

/// A converse, message or speech request that produced no usable response
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConverseError {
    pub kind: ConverseErrorKind,
    pub message: String,
    /// Wait requested by a 429 body carrying `retry_after`
    pub retry_after: Option<Duration>,
}

impl ConverseError {
    pub fn new(kind: ConverseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ConverseErrorKind::Network, message)
    }

    /// The request was sent but no complete response came back
    pub fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Wit.ai request timed out: {err}"))
        } else if err.is_connect() {
            Self::network(format!("Could not reach Wit.ai: {err}"))
        } else if err.is_body() {
            Self::network(format!("Wit.ai response was cut off: {err}"))
        } else {
            Self::new(ConverseErrorKind::Unknown, format!("Wit.ai request failed: {err}"))
        }
    }

    /// Classify a non-2xx response. Only an excerpt of the body is kept.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let excerpt = snippet(body);
        match status.as_u16() {
            401 | 403 => Self::new(
                ConverseErrorKind::Auth,
                format!("Wit.ai rejected the access token ({status}): {excerpt}"),
            ),
            429 => Self {
                retry_after: retry_after(body),
                ..Self::new(
                    ConverseErrorKind::RateLimit,
                    format!("Wit.ai is throttling this app: {excerpt}"),
                )
            },
            400 => Self::new(
                ConverseErrorKind::InvalidRequest,
                format!("Wit.ai refused the request: {excerpt}"),
            ),
            500..=599 => Self::new(
                ConverseErrorKind::ServerError,
                format!("Wit.ai failed with {status}: {excerpt}"),
            ),
            _ => Self::new(
                ConverseErrorKind::Unknown,
                format!("Unexpected {status} from Wit.ai: {excerpt}"),
            ),
        }
    }

    /// A 2xx body that does not fit the expected response shape
    pub fn decode(err: &serde_json::Error, body: &str) -> Self {
        Self::new(
            ConverseErrorKind::Decode,
            format!("Unreadable Wit.ai response ({err}): {}", snippet(body)),
        )
    }

    /// The audio file for a speech request could not be opened
    pub fn audio_file(path: &Path, err: &std::io::Error) -> Self {
        Self::new(
            ConverseErrorKind::InvalidRequest,
            format!("Cannot read audio file {}: {err}", path.display()),
        )
    }
}

fn snippet(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn retry_after(body: &str) -> Option<Duration> {
    let secs = serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("retry_after")?
        .as_f64()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

/// What went wrong, as far as a caller deciding to retry cares.
/// The action loop itself never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverseErrorKind {
    /// No complete response: refused connection, timeout, truncated body
    Network,
    /// 429 from Wit.ai
    RateLimit,
    /// 5xx from Wit.ai
    ServerError,
    /// Missing or revoked access token
    Auth,
    /// Wit.ai answered 400, or the request could not be assembled locally
    InvalidRequest,
    /// Response was 2xx but not the JSON we expected
    Decode,
    Unknown,
}

impl ConverseErrorKind {
    /// Whether sending the same request again could succeed
    pub fn is_retryable(self) -> bool {
        match self {
            Self::Network | Self::RateLimit | Self::ServerError => true,
            Self::Auth | Self::InvalidRequest | Self::Decode | Self::Unknown => false,
        }
    }
}
