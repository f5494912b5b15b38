//! Wit.ai HTTP implementation

use super::types::{Context, ConverseResponse, MessageResponse};
use super::{ConverseClient, ConverseError, ConverseErrorKind};
use crate::config::WitConfig;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Converse client backed by the Wit.ai REST API
pub struct WitClient {
    client: Client,
    access_token: String,
    base_url: String,
    api_version: String,
}

impl WitClient {
    pub fn new(config: &WitConfig) -> Result<Self, ConverseError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ConverseError::new(
                    ConverseErrorKind::Unknown,
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            client,
            access_token: config.access_token.clone(),
            base_url: config.api_host.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    /// Extract intent and entities from a single utterance
    pub async fn message(&self, text: &str) -> Result<MessageResponse, ConverseError> {
        let request = self
            .authorized(self.client.get(format!("{}/message", self.base_url)))
            .query(&[("q", text)]);
        self.execute(request).await
    }

    /// Transcribe an audio file and extract intent and entities from it.
    ///
    /// The file is streamed without a known length, so the upload goes out
    /// chunked. Content type comes from the file extension.
    pub async fn speech(&self, audio: &Path) -> Result<MessageResponse, ConverseError> {
        let file = tokio::fs::File::open(audio)
            .await
            .map_err(|e| ConverseError::audio_file(audio, &e))?;
        let content_type = mime_guess::from_path(audio).first_or_octet_stream();

        tracing::debug!(path = %audio.display(), content_type = %content_type, "Uploading speech");

        let request = self
            .authorized(self.client.post(format!("{}/speech", self.base_url)))
            .header(CONTENT_TYPE, content_type.as_ref())
            .body(Body::from(file));
        self.execute(request).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .query(&[("v", self.api_version.as_str())])
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ConverseError> {
        let response = request
            .send()
            .await
            .map_err(|e| ConverseError::transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConverseError::transport(&e))?;

        if !status.is_success() {
            return Err(ConverseError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ConverseError::decode(&e, &body))
    }
}

#[async_trait]
impl ConverseClient for WitClient {
    async fn converse(
        &self,
        session_id: &str,
        message: Option<&str>,
        context: &Context,
    ) -> Result<ConverseResponse, ConverseError> {
        let mut request = self
            .authorized(self.client.post(format!("{}/converse", self.base_url)))
            .query(&[("session_id", session_id)])
            .json(context);

        if let Some(message) = message {
            request = request.query(&[("q", message)]);
        }

        self.execute(request).await
    }
}
