//! Chatbox Core - Headless Streaming Chat Widget
//!
//! This crate holds everything a chat widget does except drawing itself: it
//! sends user text to a chat endpoint, decodes the streamed `data: ` frames
//! that come back, grows the bot message as fragments arrive, and keeps the
//! conversation consistent while feedback votes and session saves happen
//! around it. Any surface (terminal, web view, native panel) can sit on top.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Host surface                            │
//! │        renders snapshots, calls submit / feedback / close        │
//! └───────────────┬───────────────────────────────▲──────────────────┘
//!                 │                               │ subscribe()
//! ┌───────────────▼───────────────────────────────┴──────────────────┐
//! │                           ChatWindow                             │
//! │   input field · follow-ups · feedback · photo · close-and-save   │
//! │                               │                                  │
//! │                       SendOrchestrator                           │
//! │                               │                                  │
//! │   ChatTransport ──bytes──► StreamDecoder ──events──► Assembler   │
//! │                                                        │         │
//! │                                           ConversationStore      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatWindow`]: One open chat session; the type hosts talk to
//! - [`SendOrchestrator`]: Runs a single exchange end to end
//! - [`ConversationStore`]: Ordered messages with change notification
//! - [`StreamDecoder`]: Bytes to [`StreamEvent`]s, chunk-boundary safe
//! - [`ResponseAssembler`]: Events to store updates for one bot message
//! - [`WidgetConfig`]: Endpoints, request hints and feature switches
//!
//! # Quick Start
//!
//! ```ignore
//! use chatbox_core::{load_config, ChatWindow, UserId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let window = ChatWindow::connect(config, UserId::new("user-42"))?;
//!
//!     window.set_input("What can you do?");
//!     window.submit().await;
//!
//!     for message in window.messages().iter() {
//!         println!("{:?}: {}", message.sender, message.content);
//!     }
//!
//!     window.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Chat endpoint transport (HTTP)
//! - [`config`]: Widget configuration loading
//! - [`error`]: Error types per collaborator
//! - [`messages`]: Message record and identifiers
//! - [`orchestrator`]: The send flow
//! - [`photo`]: Photo upload to the vision endpoint
//! - [`session`]: Session persistence and upload
//! - [`store`]: Conversation state
//! - [`streaming`]: Stream decoding and response assembly
//! - [`window`]: The widget façade
//!
//! # No UI Dependencies
//!
//! Nothing here draws. Rendering, theming and layout belong to the host.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod messages;
pub mod orchestrator;
pub mod photo;
pub mod session;
pub mod store;
pub mod streaming;
pub mod window;

// Re-exports for convenience
pub use backend::{ChatRequest, ChatTransport, HttpTransport};
pub use error::{PhotoError, SessionError, TransportError, WindowError};
pub use messages::{Feedback, Message, MessageId, Sender, SessionId, UserId};
pub use orchestrator::{ExchangeOutcome, PendingExchange, SendOrchestrator};
pub use photo::{HttpPhotoService, PhotoService};
pub use session::{
    save_session, FileSessionStore, HttpSessionUploader, SaveOutcome, SessionData, SessionStore,
    SessionUploader,
};
pub use store::ConversationStore;
pub use streaming::{
    decode_stream, AssemblyOutcome, ByteStream, EventStream, ResponseAssembler, StreamDecoder,
    StreamEvent,
};
pub use window::{ChatWindow, ContextAction, WindowServices};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, ConversationalStyle, OutputFormat, ProviderName, WidgetConfig,
};
