//! Conversation Store
//!
//! The single source of truth for rendering. Holds the ordered message
//! sequence and applies every change as a whole-sequence replacement, so a
//! reader holding a [`snapshot`](ConversationStore::snapshot) never sees a
//! half-applied update.
//!
//! # Update model
//!
//! ```text
//!   update(id, f)
//!       │
//!       ▼
//!   write lock ──► Arc::make_mut (clones only if a snapshot is alive)
//!       │
//!       ▼
//!   f(&mut message) ──► revision += 1 ──► watchers wake and re-render
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::messages::{Feedback, Message, MessageId};

/// Ordered, id-addressable message sequence with change notification
pub struct ConversationStore {
    /// Current sequence, swapped copy-on-write
    messages: RwLock<Arc<Vec<Message>>>,
    /// Bumped after every successful mutation
    revision: watch::Sender<u64>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::with_messages(Vec::new())
    }

    /// Create a store seeded with messages (e.g. a restored session)
    #[must_use]
    pub fn with_messages(messages: Vec<Message>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            messages: RwLock::new(Arc::new(messages)),
            revision,
        }
    }

    /// Immutable view of the whole conversation
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.messages.read())
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Whether the conversation is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Get a copy of a message by ID
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<Message> {
        self.messages.read().iter().find(|m| &m.id == id).cloned()
    }

    /// Get a copy of the most recent message
    #[must_use]
    pub fn last(&self) -> Option<Message> {
        self.messages.read().last().cloned()
    }

    /// Current revision number
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Watch for changes; the value is the revision after each mutation
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Append a message
    ///
    /// Returns `false` and leaves the store untouched if a message with the
    /// same ID already exists.
    pub fn append(&self, message: Message) -> bool {
        self.append_all(vec![message])
    }

    /// Append several messages as one change, preserving their order
    ///
    /// Either all messages are appended or none are (when any ID collides).
    pub fn append_all(&self, batch: Vec<Message>) -> bool {
        if batch.is_empty() {
            return true;
        }

        {
            let mut guard = self.messages.write();
            let collides = batch.iter().enumerate().any(|(i, incoming)| {
                guard.iter().any(|m| m.id == incoming.id)
                    || batch[..i].iter().any(|m| m.id == incoming.id)
            });
            if collides {
                tracing::warn!("Refusing to append message with duplicate id");
                return false;
            }
            Arc::make_mut(&mut guard).extend(batch);
        }

        self.bump();
        true
    }

    /// Apply `transform` to the message with the given ID
    ///
    /// Returns `false` if no such message exists.
    pub fn update<F>(&self, id: &MessageId, transform: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        {
            let mut guard = self.messages.write();
            let Some(idx) = guard.iter().position(|m| &m.id == id) else {
                tracing::debug!(message_id = %id, "Update for unknown message ignored");
                return false;
            };
            transform(&mut Arc::make_mut(&mut guard)[idx]);
        }

        self.bump();
        true
    }

    /// Replace a message's content
    pub fn set_content(&self, id: &MessageId, content: impl Into<String>) -> bool {
        let content = content.into();
        self.update(id, |m| m.content = content)
    }

    /// Toggle like/dislike on a message
    pub fn toggle_feedback(&self, id: &MessageId, feedback: Feedback) -> bool {
        self.update(id, |m| m.toggle_feedback(feedback))
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("len", &self.len())
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Sender;

    #[test]
    fn test_append_preserves_order() {
        let store = ConversationStore::new();
        let user = Message::user("Hello");
        let bot = Message::pending_bot();
        let (user_id, bot_id) = (user.id.clone(), bot.id.clone());

        assert!(store.append_all(vec![user, bot]));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, user_id);
        assert_eq!(snapshot[1].id, bot_id);
        assert_eq!(snapshot[1].sender, Sender::Bot);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let store = ConversationStore::new();
        let msg = Message::user("once");
        assert!(store.append(msg.clone()));
        assert!(!store.append(msg.clone()));

        // A batch that collides internally is rejected as a whole
        let other = Message::user("other");
        assert!(!store.append_all(vec![other.clone(), other]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_updates() {
        let store = ConversationStore::new();
        let bot = Message::pending_bot();
        let id = bot.id.clone();
        store.append(bot);

        let before = store.snapshot();
        store.set_content(&id, "Hel");
        let after = store.snapshot();

        assert_eq!(before[0].content, "");
        assert_eq!(after[0].content, "Hel");
    }

    #[test]
    fn test_update_unknown_id() {
        let store = ConversationStore::new();
        let rev = store.revision();
        assert!(!store.set_content(&MessageId::new(), "nope"));
        assert_eq!(store.revision(), rev);
    }

    #[test]
    fn test_toggle_feedback() {
        let store = ConversationStore::new();
        let bot = Message::bot("answer");
        let id = bot.id.clone();
        store.append(bot);

        store.toggle_feedback(&id, Feedback::Like);
        let msg = store.get(&id).unwrap();
        assert_eq!((msg.liked, msg.disliked), (Some(true), Some(false)));

        store.toggle_feedback(&id, Feedback::Dislike);
        let msg = store.get(&id).unwrap();
        assert_eq!((msg.liked, msg.disliked), (Some(false), Some(true)));
    }

    #[tokio::test]
    async fn test_subscribers_see_revisions() {
        let store = ConversationStore::new();
        let mut rx = store.subscribe();

        store.append(Message::user("ping"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(store.revision(), 1);
    }
}
