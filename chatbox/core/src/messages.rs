//! Conversation Messages
//!
//! Identifiers and the message record shared by every part of the widget.
//! The store owns sequences of [`Message`]; everything else refers to
//! messages by [`MessageId`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat window session identifier
///
/// Stable for the lifetime of one open chat window.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User identifier, supplied by the host application
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a host-supplied user identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Message
// ============================================================================

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed by the user
    User,
    /// Produced by the chat endpoint
    Bot,
}

/// Feedback vote on a bot message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// Thumbs up
    Like,
    /// Thumbs down
    Dislike,
}

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Message text; grows while a bot response is streaming
    pub content: String,
    /// Who sent this message
    pub sender: Sender,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
    /// Thumbs-up state (absent until first vote)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    /// Thumbs-down state (absent until first vote)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disliked: Option<bool>,
    /// Suggested next prompts attached when a bot response completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
}

impl Message {
    /// Create a new message
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            liked: None,
            disliked: None,
            follow_up_questions: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    /// Create a bot message
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Sender::Bot, content)
    }

    /// Create an empty bot message that a streamed response will fill
    #[must_use]
    pub fn pending_bot() -> Self {
        Self::new(Sender::Bot, String::new())
    }

    /// Whether the message has been liked
    #[must_use]
    pub fn is_liked(&self) -> bool {
        self.liked.unwrap_or(false)
    }

    /// Whether the message has been disliked
    #[must_use]
    pub fn is_disliked(&self) -> bool {
        self.disliked.unwrap_or(false)
    }

    /// Apply a feedback vote
    ///
    /// Voting toggles the chosen flag and always clears the other one, so at
    /// most one of `liked`/`disliked` is ever true.
    pub fn toggle_feedback(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Like => {
                self.liked = Some(!self.is_liked());
                self.disliked = Some(false);
            }
            Feedback::Dislike => {
                self.liked = Some(false);
                self.disliked = Some(!self.is_disliked());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 36);
    }

    #[test]
    fn test_like_toggles() {
        let mut msg = Message::bot("hi");
        msg.toggle_feedback(Feedback::Like);
        assert_eq!(msg.liked, Some(true));
        assert_eq!(msg.disliked, Some(false));

        msg.toggle_feedback(Feedback::Like);
        assert_eq!(msg.liked, Some(false));
        assert_eq!(msg.disliked, Some(false));
    }

    #[test]
    fn test_dislike_clears_like() {
        let mut msg = Message::bot("hi");
        msg.toggle_feedback(Feedback::Like);
        msg.toggle_feedback(Feedback::Dislike);
        assert!(!msg.is_liked());
        assert!(msg.is_disliked());

        msg.toggle_feedback(Feedback::Like);
        assert!(msg.is_liked());
        assert!(!msg.is_disliked());
    }

    #[test]
    fn test_serialized_shape() {
        let mut msg = Message::bot("Hello");
        msg.follow_up_questions = Some(vec!["More?".to_string()]);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "bot");
        assert_eq!(json["content"], "Hello");
        assert_eq!(json["followUpQuestions"][0], "More?");
        assert!(json.get("liked").is_none());
        assert!(json.get("disliked").is_none());
    }
}
