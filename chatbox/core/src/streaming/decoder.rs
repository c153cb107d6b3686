//! Stream Decoder
//!
//! Turns the raw byte stream from the chat endpoint into [`StreamEvent`]s.
//!
//! # Framing
//!
//! ```text
//! data: {"text":"Hel"}\n
//! data: {"text":"lo"}\n
//! data: {"followUpQuestions":["More?"]}\n
//! data: [DONE]\n
//! ```
//!
//! Chunks may split a line (or a UTF-8 sequence) anywhere, so decoded text is
//! kept in a rolling buffer and only complete lines are interpreted.

use std::collections::VecDeque;

use futures::StreamExt;
use serde::Deserialize;

use super::{ByteStream, EventStream, StreamEvent};

/// Prefix that marks a protocol frame
const FRAME_PREFIX: &str = "data: ";

/// Frame body that terminates the response
const DONE_MARKER: &str = "[DONE]";

/// JSON payload carried by a `data:` frame
#[derive(Debug, Deserialize)]
struct FramePayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "followUpQuestions")]
    follow_up_questions: Option<Vec<String>>,
}

/// Incremental decoder for one exchange
///
/// Not restartable: once `[DONE]` has been seen every further chunk is
/// ignored.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Undecoded tail of an incomplete UTF-8 sequence
    pending_bytes: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    buffer: String,
    /// Whether `[DONE]` has been seen
    finished: bool,
    /// Frames parsed successfully
    frames: u32,
    /// Frames skipped because their payload did not parse
    malformed: u32,
}

impl StreamDecoder {
    /// Create a new decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal `[DONE]` frame has been decoded
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of frames that produced an event
    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Number of malformed frames skipped
    #[must_use]
    pub fn malformed(&self) -> u32 {
        self.malformed
    }

    /// Feed one chunk of bytes, returning the events it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.decode_utf8(chunk);

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&line[..pos]) {
                let done = matches!(event, StreamEvent::Done);
                events.push(event);
                if done {
                    self.buffer.clear();
                    self.pending_bytes.clear();
                    break;
                }
            }
        }

        events
    }

    /// Signal end of transport, flushing any unterminated final line
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        if !self.pending_bytes.is_empty() {
            self.buffer
                .push_str(&String::from_utf8_lossy(&self.pending_bytes));
            self.pending_bytes.clear();
        }

        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    /// Append decoded text to the buffer, holding back an incomplete tail
    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);

        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending_bytes[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending_bytes.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending_bytes[start..valid_end]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending_bytes.drain(..start);
    }

    /// Interpret one complete line
    fn decode_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let body = line.strip_prefix(FRAME_PREFIX)?;

        if body == DONE_MARKER {
            self.finished = true;
            self.frames += 1;
            return Some(StreamEvent::Done);
        }

        match serde_json::from_str::<FramePayload>(body) {
            Ok(payload) => {
                self.frames += 1;
                Some(match payload.follow_up_questions {
                    Some(questions) => StreamEvent::FollowUpSet(questions),
                    None => StreamEvent::ContentDelta(payload.text.unwrap_or_default()),
                })
            }
            Err(e) => {
                self.malformed += 1;
                tracing::warn!(frame = body, error = %e, "Skipping malformed stream frame");
                None
            }
        }
    }
}

/// Lazily decode a byte stream into events
///
/// The returned stream ends after `Done`, when the transport ends, or right
/// after yielding a transport read error.
pub fn decode_stream(source: ByteStream) -> EventStream {
    struct State {
        source: Option<ByteStream>,
        decoder: StreamDecoder,
        ready: VecDeque<StreamEvent>,
    }

    let state = State {
        source: Some(source),
        decoder: StreamDecoder::new(),
        ready: VecDeque::new(),
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }

            let source = state.source.as_mut()?;
            match source.next().await {
                Some(Ok(chunk)) => {
                    state.ready.extend(state.decoder.push(&chunk));
                    if state.decoder.is_finished() {
                        // Release the connection; nothing after [DONE] matters
                        state.source = None;
                    }
                }
                Some(Err(e)) => {
                    state.source = None;
                    return Some((Err(e), state));
                }
                None => {
                    state.source = None;
                    state.ready.extend(state.decoder.finish());
                }
            }
        }
    }))
}
