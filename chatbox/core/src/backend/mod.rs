//! Chat Endpoint Integration
//!
//! This module provides access to the remote chat endpoint through a common
//! trait interface.
//!
//! # Usage
//!
//! ```ignore
//! use chatbox_core::backend::{ChatRequest, ChatTransport, HttpTransport};
//!
//! let transport = HttpTransport::from_config(&config)?;
//! let request = ChatRequest::from_config("Hello!", user_id, session_id, &config);
//! let bytes = transport.open_stream(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::{ChatRequest, ChatTransport};
