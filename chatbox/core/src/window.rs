//! Chat Window
//!
//! The widget as a host application sees it. A [`ChatWindow`] owns one
//! session: it seeds the welcome message, keeps the input field, runs
//! exchanges through the [`SendOrchestrator`], and saves the conversation
//! when closed.
//!
//! Rendering is left to the host. It reads [`ChatWindow::store`] snapshots
//! and re-renders whenever [`ChatWindow::subscribe`] reports a change.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::backend::{ChatTransport, HttpTransport};
use crate::config::WidgetConfig;
use crate::error::{PhotoError, WindowError};
use crate::messages::{Feedback, Message, MessageId, Sender, SessionId, UserId};
use crate::orchestrator::{ExchangeOutcome, SendOrchestrator};
use crate::photo::{HttpPhotoService, PhotoService};
use crate::session::{
    save_session, FileSessionStore, HttpSessionUploader, SaveOutcome, SessionData, SessionStore,
    SessionUploader,
};
use crate::store::ConversationStore;

/// Actions offered by a message's context menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextAction {
    /// Copy the text to the clipboard
    Copy,
    /// Share the text through the host's share sheet
    Share,
}

/// External collaborators of a chat window
#[derive(Clone)]
pub struct WindowServices {
    /// Chat endpoint transport
    pub transport: Arc<dyn ChatTransport>,
    /// Local session persistence
    pub session_store: Arc<dyn SessionStore>,
    /// Session upload (`None` = local save only)
    pub uploader: Option<Arc<dyn SessionUploader>>,
    /// Vision endpoint (`None` = photo upload unavailable)
    pub photo: Option<Arc<dyn PhotoService>>,
}

impl WindowServices {
    /// Build the default HTTP and file collaborators from configuration
    pub fn from_config(config: &WidgetConfig) -> Result<Self, WindowError> {
        let photo: Option<Arc<dyn PhotoService>> = if config.show_photo_upload {
            Some(Arc::new(HttpPhotoService::from_config(config)?))
        } else {
            None
        };

        Ok(Self {
            transport: Arc::new(HttpTransport::from_config(config)?),
            session_store: Arc::new(FileSessionStore::from_config(config)),
            uploader: Some(Arc::new(HttpSessionUploader::from_config(config)?)),
            photo,
        })
    }
}

/// One open chat window
///
/// Cheap to clone; clones share the conversation and input field.
#[derive(Clone)]
pub struct ChatWindow {
    orchestrator: SendOrchestrator,
    input: Arc<Mutex<String>>,
    session_store: Arc<dyn SessionStore>,
    uploader: Option<Arc<dyn SessionUploader>>,
    photo: Option<Arc<dyn PhotoService>>,
}

impl ChatWindow {
    /// Open a window with a fresh session and the welcome message
    pub fn open(config: WidgetConfig, user_id: UserId, services: WindowServices) -> Self {
        let session_id = SessionId::new();
        let store = Arc::new(ConversationStore::with_messages(vec![Message::bot(
            config.welcome_message.clone(),
        )]));

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            transport = services.transport.name(),
            "Chat window opened"
        );

        let orchestrator = SendOrchestrator::new(
            store,
            services.transport,
            Arc::new(config),
            user_id,
            session_id,
        );

        Self {
            orchestrator,
            input: Arc::new(Mutex::new(String::new())),
            session_store: services.session_store,
            uploader: services.uploader,
            photo: services.photo,
        }
    }

    /// Open a window wired to the configured HTTP endpoints
    pub fn connect(config: WidgetConfig, user_id: UserId) -> Result<Self, WindowError> {
        let services = WindowServices::from_config(&config)?;
        Ok(Self::open(config, user_id, services))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The conversation
    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        self.orchestrator.store()
    }

    /// Immutable view of the conversation
    #[must_use]
    pub fn messages(&self) -> Arc<Vec<Message>> {
        self.store().snapshot()
    }

    /// Watch for conversation changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store().subscribe()
    }

    /// Session of this window
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.orchestrator.session_id()
    }

    /// Widget configuration
    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        self.orchestrator.config()
    }

    /// The orchestrator running this window's exchanges
    #[must_use]
    pub fn orchestrator(&self) -> &SendOrchestrator {
        &self.orchestrator
    }

    /// Whether the loading indicator should show
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.orchestrator.is_loading()
    }

    // ========================================================================
    // Input and sending
    // ========================================================================

    /// Replace the input field text
    pub fn set_input(&self, text: impl Into<String>) {
        *self.input.lock() = text.into();
    }

    /// Current input field text
    #[must_use]
    pub fn input(&self) -> String {
        self.input.lock().clone()
    }

    /// Send the input field text
    ///
    /// The field is cleared when the exchange starts. Whitespace-only input
    /// stays in the field and nothing is sent.
    pub async fn submit(&self) -> ExchangeOutcome {
        let text = {
            let mut input = self.input.lock();
            if input.trim().is_empty() {
                return ExchangeOutcome::Skipped;
            }
            std::mem::take(&mut *input)
        };
        self.orchestrator.send(&text).await
    }

    /// Send `text` directly, bypassing the input field
    pub async fn send(&self, text: &str) -> ExchangeOutcome {
        self.orchestrator.send(text).await
    }

    /// Send `text` on a new task
    pub fn spawn_send(&self, text: impl Into<String>) -> tokio::task::JoinHandle<ExchangeOutcome> {
        self.orchestrator.spawn_send(text)
    }

    // ========================================================================
    // Follow-ups, feedback, context menu
    // ========================================================================

    /// Suggestions to offer under the conversation
    ///
    /// Only the last message's follow-ups are offered, and only when it is a
    /// bot message and follow-ups are enabled.
    #[must_use]
    pub fn follow_up_suggestions(&self) -> Vec<String> {
        if !self.config().follow_ups_enabled() {
            return Vec::new();
        }
        match self.store().last() {
            Some(last) if last.sender == Sender::Bot => {
                last.follow_up_questions.unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    /// Send the suggestion at `index`, clearing the input field
    ///
    /// Returns `None` if there is no such suggestion.
    pub async fn choose_follow_up(&self, index: usize) -> Option<ExchangeOutcome> {
        let question = self.take_follow_up(index)?;
        Some(self.orchestrator.send(&question).await)
    }

    /// Like [`choose_follow_up`](Self::choose_follow_up), on a new task
    pub fn spawn_follow_up(&self, index: usize) -> Option<tokio::task::JoinHandle<ExchangeOutcome>> {
        let question = self.take_follow_up(index)?;
        Some(self.orchestrator.spawn_send(question))
    }

    fn take_follow_up(&self, index: usize) -> Option<String> {
        let question = self.follow_up_suggestions().into_iter().nth(index)?;
        self.input.lock().clear();
        Some(question)
    }

    /// Toggle like/dislike on a bot message
    ///
    /// Returns `false` if feedback is disabled, the message does not exist,
    /// or it is not a bot message.
    pub fn toggle_feedback(&self, id: &MessageId, feedback: Feedback) -> bool {
        if !self.config().show_like_dislike {
            return false;
        }
        if !matches!(self.store().get(id), Some(m) if m.sender == Sender::Bot) {
            return false;
        }
        self.store().toggle_feedback(id, feedback)
    }

    /// Run a context menu action on a message
    ///
    /// Returns the text the host should copy or share.
    pub fn context_action(&self, id: &MessageId, action: ContextAction) -> Option<String> {
        let message = self.store().get(id)?;
        tracing::debug!(message_id = %id, ?action, "Context action");
        Some(message.content)
    }

    // ========================================================================
    // Photo upload
    // ========================================================================

    /// Upload a photo and append the vision endpoint's answer as a bot message
    ///
    /// Nothing is appended on failure.
    pub async fn upload_photo(&self, file_name: &str, bytes: Vec<u8>) -> Result<MessageId, PhotoError> {
        let service = match &self.photo {
            Some(service) if self.config().show_photo_upload => service,
            _ => return Err(PhotoError::Disabled),
        };

        match service.describe(file_name, bytes).await {
            Ok(text) => {
                let message = Message::bot(text);
                let id = message.id.clone();
                self.store().append(message);
                Ok(id)
            }
            Err(e) => {
                tracing::error!(file_name, error = %e, "Error uploading photo");
                Err(e)
            }
        }
    }

    // ========================================================================
    // Close
    // ========================================================================

    /// Save the session locally and upload it if online
    ///
    /// Exchanges still streaming are not cancelled; the save captures the
    /// conversation as it stands.
    pub async fn close(&self) -> SaveOutcome {
        let session = SessionData {
            id: self.session_id().clone(),
            messages: self.messages().to_vec(),
        };
        let outcome = save_session(
            self.session_store.as_ref(),
            self.uploader.as_deref(),
            &session,
        )
        .await;

        tracing::info!(
            session_id = %session.id,
            persisted = outcome.persisted,
            uploaded = outcome.uploaded,
            "Chat window closed"
        );
        outcome
    }
}

impl std::fmt::Debug for ChatWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWindow")
            .field("orchestrator", &self.orchestrator)
            .field("messages", &self.store().len())
            .finish()
    }
}
