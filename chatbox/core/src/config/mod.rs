//! Widget Configuration
//!
//! Centralized configuration loading for the chat widget, with a TOML file at
//! `~/.config/chatbox/widget.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! chat_endpoint = "https://chat.example.com/chat"
//! session_upload_endpoint = "https://chat.example.com/upload"
//! provider_name = "openai"
//! conversational_style = "concise"
//! output_format = "markdown"
//! follow_up_questions = 3
//! show_like_dislike = true
//! show_photo_upload = false
//! network_failure_msg = "An error occurred. Please try again."
//! welcome_message = "Hello. How may I assist you today?"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for the follow-up question hint
pub const MAX_FOLLOW_UP_QUESTIONS: u32 = 10;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    #[default]
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Request Options
// =============================================================================

/// Chat provider the endpoint should route to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    /// OpenAI models
    #[serde(rename = "openai")]
    OpenAI,
    /// Anthropic Claude models
    #[default]
    Claude,
    /// Local Ollama models
    Ollama,
}

impl ProviderName {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Claude => "claude",
            Self::Ollama => "ollama",
        }
    }

    /// Parse a wire name (case-insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "claude" => Some(Self::Claude),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }
}

/// Tone the endpoint is asked to answer in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ConversationalStyle {
    #[default]
    Friendly,
    Professional,
    Casual,
    Formal,
    Technical,
    Humorous,
    Empathetic,
    Concise,
    Elaborate,
    Socratic,
}

impl ConversationalStyle {
    /// All styles, in display order
    pub const ALL: [Self; 10] = [
        Self::Friendly,
        Self::Professional,
        Self::Casual,
        Self::Formal,
        Self::Technical,
        Self::Humorous,
        Self::Empathetic,
        Self::Concise,
        Self::Elaborate,
        Self::Socratic,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friendly => "friendly",
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Formal => "formal",
            Self::Technical => "technical",
            Self::Humorous => "humorous",
            Self::Empathetic => "empathetic",
            Self::Concise => "concise",
            Self::Elaborate => "elaborate",
            Self::Socratic => "socratic",
        }
    }

    /// Parse a wire name (case-insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|style| style.as_str() == s)
    }
}

/// Format the endpoint should produce
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON text
    Json,
    /// Markdown (rendered by the host)
    #[default]
    Markdown,
    /// Plain text
    Text,
}

impl OutputFormat {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }

    /// Parse a wire name (case-insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "markdown" => Some(Self::Markdown),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

// =============================================================================
// Widget Configuration
// =============================================================================

/// Complete widget configuration
///
/// Every field has a default, so a partial TOML file is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Streaming chat endpoint (POST)
    pub chat_endpoint: String,
    /// Session upload endpoint (POST, on close)
    pub session_upload_endpoint: String,
    /// Vision endpoint for photo uploads (POST, multipart)
    pub photo_endpoint: String,
    /// Provider hint sent with every request
    pub provider_name: ProviderName,
    /// Style hint sent with every request
    pub conversational_style: ConversationalStyle,
    /// Output format hint sent with every request
    pub output_format: OutputFormat,
    /// Whether bot messages offer like/dislike feedback
    pub show_like_dislike: bool,
    /// Whether photo upload is offered
    pub show_photo_upload: bool,
    /// Number of follow-up questions to request (0 disables suggestions)
    pub follow_up_questions: u32,
    /// Shown in place of the bot response when the request fails
    pub network_failure_msg: String,
    /// First bot message of every session
    pub welcome_message: String,
    /// Connection timeout for HTTP requests in milliseconds
    pub connect_timeout_ms: u64,
    /// Directory for saved sessions (`None` = XDG data dir)
    pub session_dir: Option<PathBuf>,

    /// Path of the file that was loaded, if any
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,

    /// Where the effective values came from
    #[serde(skip)]
    source: ConfigSource,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            chat_endpoint: "http://localhost:3001/chat".to_string(),
            session_upload_endpoint: "http://localhost:3001/upload".to_string(),
            photo_endpoint: "http://localhost:3001/api/vision-chat".to_string(),
            provider_name: ProviderName::default(),
            conversational_style: ConversationalStyle::default(),
            output_format: OutputFormat::default(),
            show_like_dislike: true,
            show_photo_upload: true,
            follow_up_questions: 3,
            network_failure_msg: "An error occurred. Please try again.".to_string(),
            welcome_message: "Hello. How may I assist you today?".to_string(),
            connect_timeout_ms: 10_000,
            session_dir: None,
            source: ConfigSource::Default,
            config_file_path: None,
        }
    }
}

impl WidgetConfig {
    /// Where the effective configuration came from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Connection timeout as a `Duration`
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Whether follow-up suggestions are requested and shown
    #[must_use]
    pub fn follow_ups_enabled(&self) -> bool {
        self.follow_up_questions > 0
    }

    /// Directory sessions are saved to
    #[must_use]
    pub fn resolved_session_dir(&self) -> PathBuf {
        self.session_dir.clone().unwrap_or_else(default_session_dir)
    }

    /// Check value constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("chat_endpoint", &self.chat_endpoint),
            ("session_upload_endpoint", &self.session_upload_endpoint),
            ("photo_endpoint", &self.photo_endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }

        if self.follow_up_questions > MAX_FOLLOW_UP_QUESTIONS {
            return Err(ConfigError::ValidationError(format!(
                "follow_up_questions must be at most {MAX_FOLLOW_UP_QUESTIONS}, got {}",
                self.follow_up_questions
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/chatbox/widget.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chatbox").join("widget.toml"))
}

/// Default directory for saved sessions
#[must_use]
pub fn default_session_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chatbox")
        .join("sessions")
}

/// Load configuration from the default path plus environment
pub fn load_config() -> Result<WidgetConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path plus environment
///
/// A missing file is not an error; defaults are used instead.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<WidgetConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<WidgetConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = WidgetConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            config = toml::from_str(&toml_content)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut WidgetConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("CHATBOX_CHAT_ENDPOINT") {
        config.chat_endpoint = url;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env("CHATBOX_UPLOAD_ENDPOINT") {
        config.session_upload_endpoint = url;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env("CHATBOX_PHOTO_ENDPOINT") {
        config.photo_endpoint = url;
        config.source = ConfigSource::Env;
    }
    if let Some(provider) = env("CHATBOX_PROVIDER").as_deref().and_then(ProviderName::parse) {
        config.provider_name = provider;
        config.source = ConfigSource::Env;
    }
    if let Some(style) = env("CHATBOX_STYLE")
        .as_deref()
        .and_then(ConversationalStyle::parse)
    {
        config.conversational_style = style;
        config.source = ConfigSource::Env;
    }
    if let Some(format) = env("CHATBOX_OUTPUT_FORMAT").as_deref().and_then(OutputFormat::parse) {
        config.output_format = format;
        config.source = ConfigSource::Env;
    }
    if let Some(count) = env("CHATBOX_FOLLOW_UPS").and_then(|v| v.parse::<u32>().ok()) {
        config.follow_up_questions = count;
        config.source = ConfigSource::Env;
    }
    if let Some(dir) = env("CHATBOX_SESSION_DIR") {
        config.session_dir = Some(PathBuf::from(dir));
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Overrides supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Chat endpoint override
    pub chat_endpoint: Option<String>,
    /// Provider override
    pub provider_name: Option<ProviderName>,
    /// Follow-up count override
    pub follow_up_questions: Option<u32>,
}

impl ConfigOverrides {
    /// Create empty overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the chat endpoint
    #[must_use]
    pub fn with_chat_endpoint(mut self, url: String) -> Self {
        self.chat_endpoint = Some(url);
        self
    }

    /// Override the provider
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderName) -> Self {
        self.provider_name = Some(provider);
        self
    }

    /// Override the follow-up count
    #[must_use]
    pub fn with_follow_up_questions(mut self, count: u32) -> Self {
        self.follow_up_questions = Some(count);
        self
    }

    /// Apply overrides, re-validating the result
    pub fn apply(&self, config: &mut WidgetConfig) -> Result<(), ConfigError> {
        let mut changed = false;
        if let Some(ref url) = self.chat_endpoint {
            config.chat_endpoint = url.clone();
            changed = true;
        }
        if let Some(provider) = self.provider_name {
            config.provider_name = provider;
            changed = true;
        }
        if let Some(count) = self.follow_up_questions {
            config.follow_up_questions = count;
            changed = true;
        }
        if changed {
            config.source = ConfigSource::Cli;
        }
        config.validate()
    }
}
