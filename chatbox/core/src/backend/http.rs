//! HTTP Chat Transport
//!
//! Posts the chat request as JSON and exposes the response body as a raw
//! byte stream for the stream decoder.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::traits::{ChatRequest, ChatTransport};
use crate::config::WidgetConfig;
use crate::error::TransportError;
use crate::streaming::ByteStream;

/// reqwest-backed chat transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// Chat endpoint URL
    endpoint: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given endpoint
    ///
    /// Only the connection phase is bounded by `connect_timeout`; a response
    /// stream may run as long as the server keeps it open.
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    /// Create from `WidgetConfig`
    pub fn from_config(config: &WidgetConfig) -> Result<Self, TransportError> {
        Self::new(config.chat_endpoint.clone(), config.connect_timeout())
    }

    /// The chat endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        // Check for HTTP errors
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            session_id = %request.session_id,
            "Chat stream opened"
        );

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::Stream(e.to_string()))
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_creation() {
        let transport =
            HttpTransport::new("http://localhost:3001/chat", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:3001/chat");
        assert_eq!(transport.name(), "http");
    }

    #[test]
    fn test_from_config() {
        let mut config = WidgetConfig::default();
        config.chat_endpoint = "https://example.com/chat".to_string();
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.endpoint(), "https://example.com/chat");
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        // Bind then drop a listener so the port is very likely closed
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            HttpTransport::new(format!("http://{addr}/chat"), Duration::from_secs(2)).unwrap();
        let request = ChatRequest::new(
            "hi",
            crate::messages::UserId::new("u"),
            crate::messages::SessionId::new(),
        );

        let result = transport.open_stream(&request).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
