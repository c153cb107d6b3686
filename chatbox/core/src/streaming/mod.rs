//! Streamed Response Handling
//!
//! The chat endpoint answers with a newline-framed event stream. This module
//! turns that byte stream into [`StreamEvent`]s and applies them to the
//! conversation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   bytes    ┌───────────────┐  StreamEvent  ┌───────────────────┐
//! │ ByteStream │ ─────────► │ StreamDecoder │ ────────────► │ ResponseAssembler │
//! │ (network)  │            │ (line buffer) │               │ (one bot message) │
//! └────────────┘            └───────────────┘               └─────────┬─────────┘
//!                                                                     │ update(id, ..)
//!                                                                     ▼
//!                                                           ┌───────────────────┐
//!                                                           │ ConversationStore │
//!                                                           └───────────────────┘
//! ```
//!
//! One decoder and one assembler exist per exchange; neither is reused.

mod assembler;
mod decoder;

use std::pin::Pin;

use futures::Stream;

use crate::error::TransportError;

pub use assembler::{AssemblyOutcome, ResponseAssembler};
pub use decoder::{decode_stream, StreamDecoder};

/// Raw response body chunks as they arrive from the transport
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Decoded events for one exchange
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, TransportError>> + Send>>;

/// One decoded server event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text to append to the bot response
    ContentDelta(String),
    /// Suggested follow-up questions (committed on completion)
    FollowUpSet(Vec<String>),
    /// Terminal marker
    Done,
}
