//! Response Assembler
//!
//! Accumulates decoded events into the pending bot message of one exchange.

use std::time::{Duration, Instant};

use futures::StreamExt;

use super::{EventStream, StreamEvent};
use crate::error::TransportError;
use crate::messages::MessageId;
use crate::store::ConversationStore;

/// How an assembled stream ended
#[derive(Debug)]
pub enum AssemblyOutcome {
    /// `[DONE]` was observed and the message finalized
    Completed,
    /// The transport ended without `[DONE]`; committed content stands
    Ended,
    /// A read error cut the stream short; committed content stands
    Interrupted(TransportError),
}

/// Applies the events of one exchange to its bot message
#[derive(Debug)]
pub struct ResponseAssembler {
    /// The bot message being filled
    target: MessageId,
    /// Accumulated response text
    content: String,
    /// Follow-ups held until completion
    follow_ups: Option<Vec<String>>,
    /// Number of deltas applied
    delta_count: u32,
    /// When assembly started
    started_at: Instant,
}

impl ResponseAssembler {
    /// Create an assembler targeting the given bot message
    #[must_use]
    pub fn new(target: MessageId) -> Self {
        Self {
            target,
            content: String::new(),
            follow_ups: None,
            delta_count: 0,
            started_at: Instant::now(),
        }
    }

    /// The bot message being filled
    #[must_use]
    pub fn target(&self) -> &MessageId {
        &self.target
    }

    /// Text accumulated so far
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of deltas applied so far
    #[must_use]
    pub fn delta_count(&self) -> u32 {
        self.delta_count
    }

    /// Time since assembly started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Apply one event to the store
    ///
    /// Returns `true` once the message has been finalized.
    pub fn apply(&mut self, store: &ConversationStore, event: StreamEvent) -> bool {
        match event {
            StreamEvent::ContentDelta(fragment) => {
                self.content.push_str(&fragment);
                self.delta_count += 1;
                store.set_content(&self.target, self.content.clone());
                false
            }
            StreamEvent::FollowUpSet(questions) => {
                self.follow_ups = Some(questions);
                false
            }
            StreamEvent::Done => {
                self.finalize(store);
                true
            }
        }
    }

    /// Commit the final text and any non-empty follow-ups
    fn finalize(&mut self, store: &ConversationStore) {
        let content = self.content.clone();
        let follow_ups = self.follow_ups.take().filter(|q| !q.is_empty());

        store.update(&self.target, |m| {
            m.content = content;
            if follow_ups.is_some() {
                m.follow_up_questions = follow_ups;
            }
        });

        tracing::debug!(
            message_id = %self.target,
            deltas = self.delta_count,
            bytes = self.content.len(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Response assembled"
        );
    }

    /// Drive an event stream to its end
    pub async fn run(mut self, mut events: EventStream, store: &ConversationStore) -> AssemblyOutcome {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if self.apply(store, event) {
                        return AssemblyOutcome::Completed;
                    }
                }
                Err(e) => return AssemblyOutcome::Interrupted(e),
            }
        }
        AssemblyOutcome::Ended
    }
}
