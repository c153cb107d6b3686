//! Error Types
//!
//! Every failure in the widget core is recovered locally; these types exist so
//! collaborators can report what went wrong and callers can log it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the chat endpoint transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the connection failed
    #[error("Chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Chat endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// Reading the response stream failed after it had started
    #[error("Stream read failed: {0}")]
    Stream(String),
}

/// Errors from session persistence and upload
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to read or write the session file
    #[error("Session file I/O failed at {path}: {source}")]
    Io {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to encode or decode the session JSON
    #[error("Invalid session JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The upload request failed
    #[error("Session upload failed: {0}")]
    Upload(#[from] reqwest::Error),

    /// The upload endpoint answered with a non-success status
    #[error("Session upload endpoint returned {0}")]
    UploadStatus(u16),
}

/// Errors from the photo upload flow
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Photo upload is switched off in the configuration
    #[error("Photo upload is disabled")]
    Disabled,

    /// The upload request failed
    #[error("Photo upload failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The vision endpoint answered with a non-success status
    #[error("Vision endpoint returned {0}")]
    Status(u16),

    /// The response body did not have the expected shape
    #[error("Invalid vision response: {0}")]
    InvalidResponse(String),
}

/// Errors from wiring up a chat window's HTTP collaborators
#[derive(Debug, Error)]
pub enum WindowError {
    /// The chat transport could not be built
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session uploader could not be built
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The photo client could not be built
    #[error(transparent)]
    Photo(#[from] PhotoError),
}
