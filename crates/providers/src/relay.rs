//! SSE stream relay for OpenAI-style chat-completion streams.
//!
//! Turns the raw byte stream of a `text/event-stream` response into text
//! deltas, forwarding each one as soon as it is decoded while accumulating
//! the full reply and the last reported token count.
//!
//! Line reassembly is an explicit state machine ([`SseDecoder`]):
//!
//! 1. **accumulate**: decoded text is appended to a line buffer
//! 2. **extract-line**: complete lines are cut at `\n` (a trailing `\r` is dropped)
//! 3. **parse-or-reinsert**: a `data: ` payload either parses, is skipped as
//!    malformed, or is put back at the front of the buffer when the JSON ends
//!    early, and processing of the current chunk stops
//!
//! When the byte stream ends, whatever is still buffered is flushed with the
//! same rules, except that nothing is put back.

use futures::{Stream, StreamExt};
use serde_json::Value;
use serde_json::error::Category;
use std::fmt::Display;
use supportdesk_core::error::ProviderError;
use tracing::{debug, trace};

/// The result of one relayed stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Concatenation of every delta, in arrival order.
    pub reply: String,
    /// Last `usage.total_tokens` seen, 0 if the stream never reported one.
    pub tokens_used: u32,
}

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across chunks is held back until its
/// remaining bytes arrive. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (plus any held-back prefix) as possible.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    /// Flush held-back bytes at end of input.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// What a single buffered line turned out to be.
enum Line {
    /// Blank, comment, or not a `data: ` line.
    Ignored,
    /// `data: [DONE]`.
    Done,
    /// A decoded frame.
    Frame(StreamFrame),
    /// JSON that stopped before the value was complete.
    Incomplete,
    /// Anything else that failed to decode.
    Malformed,
}

/// The relay state for one streamed response.
#[derive(Debug, Default)]
pub struct SseDecoder {
    utf8: Utf8Decoder,
    buffer: String,
    reply: String,
    tokens_used: u32,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes. Every content delta decoded from it is
    /// handed to `on_delta` before this returns.
    pub fn push(&mut self, bytes: &[u8], on_delta: &mut dyn FnMut(&str)) {
        if self.done {
            return;
        }
        let text = self.utf8.decode(bytes);
        self.buffer.push_str(&text);

        while let Some(end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=end).collect();
            let line = line.trim_end_matches('\n').trim_end_matches('\r');

            match classify(line) {
                Line::Ignored | Line::Malformed => {}
                Line::Done => {
                    self.done = true;
                    self.buffer.clear();
                    return;
                }
                Line::Frame(frame) => self.apply(frame, on_delta),
                Line::Incomplete => {
                    trace!(line, "Incomplete SSE frame, waiting for more bytes");
                    self.buffer.insert(0, '\n');
                    self.buffer.insert_str(0, line);
                    return;
                }
            }
        }
    }

    /// Flush whatever is left once the byte stream has ended. Lines that
    /// still fail to parse are dropped.
    pub fn finish(&mut self, on_delta: &mut dyn FnMut(&str)) {
        if self.done {
            return;
        }
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        let rest = std::mem::take(&mut self.buffer);

        for raw in rest.split('\n') {
            let line = raw.trim_end_matches('\r');
            match classify(line) {
                Line::Done => {
                    self.done = true;
                    return;
                }
                Line::Frame(frame) => self.apply(frame, on_delta),
                Line::Incomplete | Line::Malformed => {
                    trace!(line, "Dropping unparseable SSE frame at end of stream");
                }
                Line::Ignored => {}
            }
        }
    }

    /// Whether `data: [DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The reply accumulated so far.
    pub fn reply(&self) -> &str {
        &self.reply
    }

    pub fn tokens_used(&self) -> u32 {
        self.tokens_used
    }

    pub fn into_outcome(self) -> RelayOutcome {
        RelayOutcome {
            reply: self.reply,
            tokens_used: self.tokens_used,
        }
    }

    fn apply(&mut self, frame: StreamFrame, on_delta: &mut dyn FnMut(&str)) {
        if let Some(content) = frame.content.filter(|c| !c.is_empty()) {
            self.reply.push_str(&content);
            on_delta(&content);
        }

        if let Some(total) = frame.total_tokens {
            self.tokens_used = total;
        }
    }
}

fn classify(line: &str) -> Line {
    if line.is_empty() || line.starts_with(':') {
        return Line::Ignored;
    }
    let Some(data) = line.strip_prefix("data: ") else {
        return Line::Ignored;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Line::Done;
    }

    match serde_json::from_str::<Value>(data) {
        Ok(value) => Line::Frame(StreamFrame::from_value(&value)),
        Err(e) if e.classify() == Category::Eof => Line::Incomplete,
        Err(e) => {
            trace!(data, error = %e, "Skipping malformed SSE frame");
            Line::Malformed
        }
    }
}

/// Relay a chat-completion byte stream.
///
/// `on_delta` receives every non-empty content delta as soon as it is
/// decoded. `on_done` is called exactly once with the final token count
/// after the stream ends or `data: [DONE]` arrives; anything after the
/// marker is never read. A transport error aborts the relay with
/// [`ProviderError::StreamInterrupted`] and `on_done` is not called.
///
/// Dropping the returned future drops `stream`.
pub async fn relay<S, B, E, F, D>(
    stream: S,
    mut on_delta: F,
    on_done: D,
) -> Result<RelayOutcome, ProviderError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str),
    D: FnOnce(u32),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| ProviderError::StreamInterrupted(e.to_string()))?;
        decoder.push(bytes.as_ref(), &mut on_delta);
        if decoder.is_done() {
            break;
        }
    }
    decoder.finish(&mut on_delta);

    debug!(
        chars = decoder.reply().chars().count(),
        tokens_used = decoder.tokens_used(),
        "Stream relay finished"
    );
    on_done(decoder.tokens_used());
    Ok(decoder.into_outcome())
}

/// Build the error for a non-success response.
///
/// The message comes from the JSON `error` field when present (either a
/// string or an object with a `message`), otherwise the status reason.
pub fn upstream_error(status_code: u16, body: &str) -> ProviderError {
    let from_body = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("error")? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => other.get("message")?.as_str().map(str::to_string),
        })
        .filter(|m| !m.is_empty());

    let message = from_body.unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status_code}"))
    });

    ProviderError::Upstream {
        status_code,
        message,
    }
}

// --- Streaming SSE types ---

/// The parts of a `data: {...}` frame the relay cares about.
///
/// The content delta and the usage count are read independently, so a
/// field of an unexpected type only loses that field.
#[derive(Debug, Default)]
struct StreamFrame {
    content: Option<String>,
    total_tokens: Option<u32>,
}

impl StreamFrame {
    fn from_value(value: &Value) -> Self {
        Self {
            content: value
                .pointer("/choices/0/delta/content")
                .and_then(Value::as_str)
                .map(str::to_string),
            total_tokens: value
                .pointer("/usage/total_tokens")
                .and_then(Value::as_u64)
                .and_then(|t| u32::try_from(t).ok()),
        }
    }
}
