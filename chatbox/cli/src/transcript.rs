//! Incremental transcript rendering
//!
//! Turns successive conversation snapshots into the text that still needs
//! printing: new messages get a numbered header, streaming messages get only
//! their newly arrived suffix.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use chatbox_core::{Message, MessageId, Sender};

/// Remembers what has been printed so far
#[derive(Debug, Default)]
pub struct Transcript {
    /// Content of each message as last printed
    printed: HashMap<MessageId, String>,
    /// Messages whose follow-ups were listed
    follow_ups_listed: HashSet<MessageId>,
    /// Message the cursor is currently continuing
    current: Option<MessageId>,
    /// Whether to list follow-up suggestions
    show_follow_ups: bool,
}

impl Transcript {
    /// Create a transcript
    #[must_use]
    pub fn new(show_follow_ups: bool) -> Self {
        Self {
            show_follow_ups,
            ..Self::default()
        }
    }

    /// Text to print for the latest snapshot
    pub fn render(&mut self, messages: &[Message]) -> String {
        let mut out = String::new();

        for (index, message) in messages.iter().enumerate() {
            let content = &message.content;
            // None for new messages and for content replaced rather than extended
            let suffix_from = self
                .printed
                .get(&message.id)
                .filter(|done| content.starts_with(done.as_str()))
                .map(String::len);
            match suffix_from {
                Some(done) if done == content.len() => {}
                Some(done) => {
                    if self.current.as_ref() != Some(&message.id) {
                        self.start(&mut out, index, message);
                        out.push_str("...");
                    }
                    out.push_str(&content[done..]);
                }
                None => {
                    self.start(&mut out, index, message);
                    out.push_str(content);
                }
            }
            self.printed.insert(message.id.clone(), content.clone());

            if self.show_follow_ups && !self.follow_ups_listed.contains(&message.id) {
                if let Some(questions) = message.follow_up_questions.as_ref().filter(|q| !q.is_empty()) {
                    out.push('\n');
                    for (n, question) in questions.iter().enumerate() {
                        let _ = writeln!(out, "    ({}) {question}", n + 1);
                    }
                    out.push_str("    /follow N to ask");
                    self.follow_ups_listed.insert(message.id.clone());
                    self.current = None;
                }
            }
        }

        out
    }

    /// Begin a new line for `message`
    fn start(&mut self, out: &mut String, index: usize, message: &Message) {
        if !self.printed.is_empty() || self.current.is_some() {
            out.push('\n');
        }
        let who = match message.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        let _ = write!(out, "[{}] {who}: ", index + 1);
        self.current = Some(message.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_messages_get_headers() {
        let mut transcript = Transcript::new(true);
        let messages = vec![Message::bot("Welcome"), Message::user("Hi")];

        assert_eq!(transcript.render(&messages), "[1] bot: Welcome\n[2] you: Hi");
        assert_eq!(transcript.render(&messages), "");
    }

    #[test]
    fn test_streaming_prints_only_suffix() {
        let mut transcript = Transcript::new(true);
        let mut bot = Message::pending_bot();
        assert_eq!(transcript.render(&[bot.clone()]), "[1] bot: ");

        bot.content = "Hel".to_string();
        assert_eq!(transcript.render(&[bot.clone()]), "Hel");

        bot.content = "Hello".to_string();
        assert_eq!(transcript.render(&[bot.clone()]), "lo");
    }

    #[test]
    fn test_interleaved_streams_resume_with_header() {
        let mut transcript = Transcript::new(true);
        let mut a = Message::pending_bot();
        let mut b = Message::pending_bot();
        transcript.render(&[a.clone(), b.clone()]);

        a.content = "one".to_string();
        assert_eq!(transcript.render(&[a.clone(), b.clone()]), "\n[1] bot: ...one");

        b.content = "two".to_string();
        assert_eq!(transcript.render(&[a, b]), "\n[2] bot: ...two");
    }

    #[test]
    fn test_replaced_content_is_reprinted() {
        let mut transcript = Transcript::new(true);
        let mut bot = Message::bot("né");
        transcript.render(&[bot.clone()]);

        // Longer, but the old byte length falls inside a multi-byte char
        bot.content = "üées".to_string();
        assert_eq!(transcript.render(&[bot.clone()]), "\n[1] bot: üées");

        bot.content = "Sorry".to_string();
        assert_eq!(transcript.render(&[bot.clone()]), "\n[1] bot: Sorry");
        assert_eq!(transcript.render(&[bot]), "");
    }

    #[test]
    fn test_follow_ups_listed_once() {
        let mut transcript = Transcript::new(true);
        let mut bot = Message::bot("Hello");
        transcript.render(&[bot.clone()]);

        bot.follow_up_questions = Some(vec!["More?".to_string()]);
        assert_eq!(
            transcript.render(&[bot.clone()]),
            "\n    (1) More?\n    /follow N to ask"
        );
        assert_eq!(transcript.render(&[bot]), "");
    }

    #[test]
    fn test_follow_ups_hidden_when_disabled() {
        let mut transcript = Transcript::new(false);
        let mut bot = Message::bot("Hello");
        bot.follow_up_questions = Some(vec!["More?".to_string()]);
        assert_eq!(transcript.render(&[bot]), "[1] bot: Hello");
    }
}
