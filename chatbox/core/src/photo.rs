//! Photo Upload
//!
//! Sends an image to the vision endpoint as a multipart form and returns the
//! endpoint's text answer, which the chat window appends as a bot message.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::WidgetConfig;
use crate::error::PhotoError;

/// Multipart field the vision endpoint reads the image from
pub const PHOTO_FIELD: &str = "photo";

/// Vision endpoint collaborator
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Upload one image and return the endpoint's text response
    async fn describe(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, PhotoError>;
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    response: Option<String>,
}

/// reqwest-backed vision client
#[derive(Clone, Debug)]
pub struct HttpPhotoService {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpPhotoService {
    /// Create a client for the given endpoint
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Result<Self, PhotoError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    /// Create from `WidgetConfig`
    pub fn from_config(config: &WidgetConfig) -> Result<Self, PhotoError> {
        Self::new(config.photo_endpoint.clone(), config.connect_timeout())
    }

    /// The vision endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PhotoService for HttpPhotoService {
    async fn describe(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, PhotoError> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part(PHOTO_FIELD, part);

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PhotoError::Status(response.status().as_u16()));
        }

        let body: VisionResponse = response
            .json()
            .await
            .map_err(|e| PhotoError::InvalidResponse(e.to_string()))?;

        tracing::debug!(file_name, size, "Photo described");

        body.response
            .ok_or_else(|| PhotoError::InvalidResponse("missing `response` field".to_string()))
    }
}
