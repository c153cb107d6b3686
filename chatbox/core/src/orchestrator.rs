//! Send Orchestrator
//!
//! Runs one chat exchange from start to finish:
//!
//! ```text
//!   send(text)
//!     │ whitespace only? ──► Skipped
//!     ▼
//!   append user + empty bot message (one store change)
//!     │
//!     ▼
//!   in_flight += 1 ──────────────────────────────┐
//!     │                                          │
//!     ▼                                          │
//!   transport.open_stream ── Err ──► bot := failure text ──► TransportFailed
//!     │ Ok                                       │
//!     ▼                                          │
//!   decode_stream ──► ResponseAssembler ──► Completed / StreamEnded
//!                                                │
//!   in_flight -= 1 (guard drop) ◄────────────────┘
//! ```
//!
//! Exchanges are independent: each one only ever touches its own bot
//! message, so several may stream at the same time.

use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::{ChatRequest, ChatTransport};
use crate::config::WidgetConfig;
use crate::messages::{Message, MessageId, SessionId, UserId};
use crate::store::ConversationStore;
use crate::streaming::{decode_stream, AssemblyOutcome, ResponseAssembler};

/// Message IDs of one exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingExchange {
    /// The user's message
    pub user: MessageId,
    /// The bot message the response streams into
    pub bot: MessageId,
}

/// How an exchange ended
///
/// None of these is an error for the caller; the conversation already shows
/// whatever the user should see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Input was empty or whitespace; nothing was appended or sent
    Skipped,
    /// The stream finished with `[DONE]`
    Completed {
        /// Messages of the exchange
        exchange: PendingExchange,
    },
    /// No stream was obtained; the bot message shows the failure text
    TransportFailed {
        /// Messages of the exchange
        exchange: PendingExchange,
    },
    /// The stream ended without `[DONE]`; partial content stands
    StreamEnded {
        /// Messages of the exchange
        exchange: PendingExchange,
        /// A read error cut the stream short
        interrupted: bool,
    },
}

impl ExchangeOutcome {
    /// Messages of the exchange, if one was started
    #[must_use]
    pub fn exchange(&self) -> Option<&PendingExchange> {
        match self {
            Self::Skipped => None,
            Self::Completed { exchange }
            | Self::TransportFailed { exchange }
            | Self::StreamEnded { exchange, .. } => Some(exchange),
        }
    }
}

// ============================================================================
// In-flight tracking
// ============================================================================

/// Decrements the in-flight counter when dropped
struct InFlightGuard {
    counter: watch::Sender<usize>,
}

impl InFlightGuard {
    fn acquire(counter: &watch::Sender<usize>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self {
            counter: counter.clone(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n = n.saturating_sub(1));
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

struct Inner {
    store: Arc<ConversationStore>,
    transport: Arc<dyn ChatTransport>,
    config: Arc<WidgetConfig>,
    user_id: UserId,
    session_id: SessionId,
    in_flight: watch::Sender<usize>,
}

/// Drives chat exchanges against one store and transport
///
/// Cheap to clone; clones share the store and in-flight counter.
#[derive(Clone)]
pub struct SendOrchestrator {
    inner: Arc<Inner>,
}

impl SendOrchestrator {
    /// Create an orchestrator
    pub fn new(
        store: Arc<ConversationStore>,
        transport: Arc<dyn ChatTransport>,
        config: Arc<WidgetConfig>,
        user_id: UserId,
        session_id: SessionId,
    ) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                config,
                user_id,
                session_id,
                in_flight,
            }),
        }
    }

    /// The conversation this orchestrator writes to
    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.inner.store
    }

    /// Widget configuration
    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    /// Session ID sent with every request
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// User ID sent with every request
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.inner.user_id
    }

    /// Number of exchanges currently running
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.borrow()
    }

    /// Whether the loading indicator should show
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    /// Watch the in-flight count
    #[must_use]
    pub fn subscribe_in_flight(&self) -> watch::Receiver<usize> {
        self.inner.in_flight.subscribe()
    }

    /// Run one exchange to completion
    ///
    /// The user text is stored exactly as given; only the emptiness check
    /// looks at the trimmed form.
    pub async fn send(&self, text: &str) -> ExchangeOutcome {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring empty message");
            return ExchangeOutcome::Skipped;
        }

        let inner = &self.inner;
        let user = Message::user(text);
        let bot = Message::pending_bot();
        let exchange = PendingExchange {
            user: user.id.clone(),
            bot: bot.id.clone(),
        };
        inner.store.append_all(vec![user, bot]);

        let _guard = InFlightGuard::acquire(&inner.in_flight);

        let request = ChatRequest::from_config(
            text,
            inner.user_id.clone(),
            inner.session_id.clone(),
            &inner.config,
        );

        tracing::debug!(
            transport = inner.transport.name(),
            session_id = %inner.session_id,
            message_id = %exchange.bot,
            "Sending chat request"
        );

        let bytes = match inner.transport.open_stream(&request).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    session_id = %inner.session_id,
                    message_id = %exchange.bot,
                    error = %e,
                    "Chat request failed"
                );
                inner
                    .store
                    .set_content(&exchange.bot, inner.config.network_failure_msg.clone());
                return ExchangeOutcome::TransportFailed { exchange };
            }
        };

        let assembler = ResponseAssembler::new(exchange.bot.clone());
        match assembler.run(decode_stream(bytes), &inner.store).await {
            AssemblyOutcome::Completed => ExchangeOutcome::Completed { exchange },
            AssemblyOutcome::Ended => {
                tracing::debug!(message_id = %exchange.bot, "Stream ended without [DONE]");
                ExchangeOutcome::StreamEnded {
                    exchange,
                    interrupted: false,
                }
            }
            AssemblyOutcome::Interrupted(e) => {
                tracing::warn!(
                    message_id = %exchange.bot,
                    error = %e,
                    "Stream interrupted, keeping partial response"
                );
                ExchangeOutcome::StreamEnded {
                    exchange,
                    interrupted: true,
                }
            }
        }
    }

    /// Run an exchange on a new task
    pub fn spawn_send(&self, text: impl Into<String>) -> tokio::task::JoinHandle<ExchangeOutcome> {
        let this = self.clone();
        let text = text.into();
        tokio::spawn(async move { this.send(&text).await })
    }
}

impl std::fmt::Debug for SendOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendOrchestrator")
            .field("transport", &self.inner.transport.name())
            .field("session_id", &self.inner.session_id)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
