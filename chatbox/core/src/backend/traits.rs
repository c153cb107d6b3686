//! Chat Transport Traits
//!
//! Trait definitions for the chat endpoint. This abstraction lets the send
//! orchestrator run against HTTP in production and scripted byte streams in
//! tests without changing core logic.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{ConversationalStyle, OutputFormat, ProviderName, WidgetConfig};
use crate::error::TransportError;
use crate::messages::{SessionId, UserId};
use crate::streaming::ByteStream;

/// Body of one chat request
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message text
    pub message: String,
    /// Host-supplied user identifier
    pub user_id: UserId,
    /// Chat window session identifier
    pub session_id: SessionId,
    /// Provider hint
    pub provider_name: ProviderName,
    /// How many follow-up questions the server should suggest
    pub follow_up_questions: u32,
    /// Style hint
    pub conversational_style: ConversationalStyle,
    /// Output format hint
    pub output_format: OutputFormat,
}

impl ChatRequest {
    /// Create a request with default hints
    pub fn new(message: impl Into<String>, user_id: UserId, session_id: SessionId) -> Self {
        Self {
            message: message.into(),
            user_id,
            session_id,
            provider_name: ProviderName::default(),
            follow_up_questions: 0,
            conversational_style: ConversationalStyle::default(),
            output_format: OutputFormat::default(),
        }
    }

    /// Create a request carrying the configured hints
    pub fn from_config(
        message: impl Into<String>,
        user_id: UserId,
        session_id: SessionId,
        config: &WidgetConfig,
    ) -> Self {
        Self::new(message, user_id, session_id)
            .with_provider(config.provider_name)
            .with_follow_up_questions(config.follow_up_questions)
            .with_style(config.conversational_style)
            .with_output_format(config.output_format)
    }

    /// Set provider hint
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderName) -> Self {
        self.provider_name = provider;
        self
    }

    /// Set follow-up question count
    #[must_use]
    pub fn with_follow_up_questions(mut self, count: u32) -> Self {
        self.follow_up_questions = count;
        self
    }

    /// Set style hint
    #[must_use]
    pub fn with_style(mut self, style: ConversationalStyle) -> Self {
        self.conversational_style = style;
        self
    }

    /// Set output format hint
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}

/// Chat endpoint transport
///
/// Implement this trait to talk to the chat endpoint over a different
/// channel.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport name for logs (e.g. "http")
    fn name(&self) -> &str;

    /// Send a request and return the response body as a byte stream
    ///
    /// Errors here mean no stream was obtained: the request was rejected or
    /// the connection failed. Errors while reading are yielded by the stream.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}
