//! Session Persistence
//!
//! When the chat window closes, the conversation is saved locally and, if
//! the upload endpoint is reachable, uploaded. Both steps are best effort:
//! failures are logged and never reach the user or block closing.
//!
//! # Design Philosophy
//!
//! The widget core only knows the [`SessionStore`] and [`SessionUploader`]
//! traits. [`FileSessionStore`] and [`HttpSessionUploader`] are the default
//! adapters; hosts can swap in their own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WidgetConfig;
use crate::error::SessionError;
use crate::messages::{Message, SessionId};

/// How long the reachability probe may take
const ONLINE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// A saved conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Session identifier
    pub id: SessionId,
    /// Conversation at the time of saving
    pub messages: Vec<Message>,
}

/// Local session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save the conversation under the session ID, replacing any earlier save
    async fn persist(&self, session_id: &SessionId, messages: &[Message]) -> Result<(), SessionError>;
}

/// Remote session upload
#[async_trait]
pub trait SessionUploader: Send + Sync {
    /// Whether an upload is worth attempting right now
    async fn is_online(&self) -> bool;

    /// Upload a saved session
    async fn upload(&self, session: &SessionData) -> Result<(), SessionError>;
}

// ============================================================================
// File store
// ============================================================================

/// Stores each session as `chat_session_<id>.json` in a directory
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir` (created on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create from `WidgetConfig`
    #[must_use]
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self::new(config.resolved_session_dir())
    }

    /// Directory sessions are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a session
    #[must_use]
    pub fn path_for(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("chat_session_{session_id}.json"))
    }

    /// Load a previously saved session
    ///
    /// Returns `Ok(None)` if the session was never saved.
    pub async fn load(&self, session_id: &SessionId) -> Result<Option<SessionData>, SessionError> {
        let path = self.path_for(session_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn persist(&self, session_id: &SessionId, messages: &[Message]) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SessionError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let data = SessionData {
            id: session_id.clone(),
            messages: messages.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&data)?;

        let path = self.path_for(session_id);
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), messages = messages.len(), "Session saved");
        Ok(())
    }
}

// ============================================================================
// HTTP uploader
// ============================================================================

/// Posts sessions as JSON to the upload endpoint
#[derive(Clone, Debug)]
pub struct HttpSessionUploader {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpSessionUploader {
    /// Create an uploader for the given endpoint
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Result<Self, SessionError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    /// Create from `WidgetConfig`
    pub fn from_config(config: &WidgetConfig) -> Result<Self, SessionError> {
        Self::new(config.session_upload_endpoint.clone(), config.connect_timeout())
    }

    /// The upload endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SessionUploader for HttpSessionUploader {
    async fn is_online(&self) -> bool {
        // Any HTTP answer, even an error status, means the host is reachable
        self.http_client
            .head(&self.endpoint)
            .timeout(ONLINE_PROBE_TIMEOUT)
            .send()
            .await
            .is_ok()
    }

    async fn upload(&self, session: &SessionData) -> Result<(), SessionError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(session)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SessionError::UploadStatus(response.status().as_u16()));
        }

        tracing::debug!(session_id = %session.id, "Session uploaded");
        Ok(())
    }
}

// ============================================================================
// Save routine
// ============================================================================

/// What [`save_session`] managed to do
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Saved locally
    pub persisted: bool,
    /// Uploaded to the server
    pub uploaded: bool,
}

/// Save a session locally, then upload it if online
///
/// Never fails: errors are logged. A failed local save skips the upload.
pub async fn save_session(
    store: &dyn SessionStore,
    uploader: Option<&dyn SessionUploader>,
    session: &SessionData,
) -> SaveOutcome {
    let mut outcome = SaveOutcome::default();

    if let Err(e) = store.persist(&session.id, &session.messages).await {
        tracing::error!(session_id = %session.id, error = %e, "Error saving session");
        return outcome;
    }
    outcome.persisted = true;

    let Some(uploader) = uploader else {
        return outcome;
    };

    if !uploader.is_online().await {
        tracing::info!(session_id = %session.id, "Offline, skipping session upload");
        return outcome;
    }

    match uploader.upload(session).await {
        Ok(()) => outcome.uploaded = true,
        Err(e) => {
            tracing::error!(session_id = %session.id, error = %e, "Error uploading session");
        }
    }

    outcome
}
