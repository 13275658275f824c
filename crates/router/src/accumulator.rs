//! Streaming accumulation with sentinel-aware buffering.
//!
//! Deltas are collected into a running buffer, but no partial text is
//! surfaced to a consumer until the trimmed buffer exceeds
//! [`SENTINEL_HOLD_CHARS`] — otherwise a UI could flash the sentinel
//! token (possibly whitespace-padded) before enough has arrived to
//! disambiguate it from a real answer. Usage metadata is tolerated on any chunk, including none.

use groundwire_core::engine::{StreamChunk, Usage};
use groundwire_core::routing::{SENTINEL, SENTINEL_HOLD_CHARS};

/// The fully accumulated reply of one streaming engine call.
#[derive(Debug, Clone)]
pub struct AccumulatedReply {
    /// Concatenation of every content delta, in arrival order
    pub text: String,
    /// Usage summary, if the stream delivered one
    pub usage: Option<Usage>,
}

/// Accumulates stream chunks and meters out visible text.
#[derive(Debug)]
pub struct StreamAccumulator {
    buffer: String,
    /// Byte offset of the first unreleased character
    released: usize,
    hold_chars: usize,
    usage: Option<Usage>,
}

impl StreamAccumulator {
    /// Accumulator with the standard sentinel hold threshold.
    pub fn new() -> Self {
        Self::with_hold(SENTINEL_HOLD_CHARS)
    }

    /// Accumulator with a custom hold threshold (tests).
    pub fn with_hold(hold_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            released: 0,
            hold_chars,
            usage: None,
        }
    }

    /// Feed one chunk; returns newly releasable visible text, if any.
    pub fn push(&mut self, chunk: &StreamChunk) -> Option<String> {
        if let Some(usage) = &chunk.usage {
            self.usage = Some(usage.clone());
        }
        if let Some(content) = &chunk.content {
            self.buffer.push_str(content);
        }
        self.release()
    }

    fn release(&mut self) -> Option<String> {
        // Measure the trimmed buffer: whitespace padding around the
        // sentinel must not push it past the hold
        if self.buffer.trim().chars().count() <= self.hold_chars {
            return None;
        }
        self.take_unreleased()
    }

    /// Release whatever is still held, regardless of the threshold.
    ///
    /// Called once the stream has ended and the buffer is known not to be
    /// the sentinel (short answers like "Paris." never cross the hold
    /// threshold on their own).
    pub fn take_tail(&mut self) -> Option<String> {
        self.take_unreleased()
    }

    fn take_unreleased(&mut self) -> Option<String> {
        if self.released == self.buffer.len() {
            return None;
        }
        let out = self.buffer[self.released..].to_string();
        self.released = self.buffer.len();
        Some(out)
    }

    /// Whether the trimmed buffer is exactly the sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.buffer.trim() == SENTINEL
    }

    /// The full buffer accumulated so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Consume the accumulator into the final reply.
    pub fn finish(self) -> AccumulatedReply {
        AccumulatedReply {
            text: self.buffer,
            usage: self.usage,
        }
    }
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(text: &str) -> StreamChunk {
        StreamChunk {
            content: Some(text.into()),
            done: false,
            usage: None,
        }
    }

    #[test]
    fn holds_text_until_past_sentinel_length() {
        let mut acc = StreamAccumulator::new();
        // "NEED_WIKI" is 9 chars — must never be released early
        assert!(acc.push(&delta("NEED_")).is_none());
        assert!(acc.push(&delta("WIKI")).is_none());
        assert!(acc.is_sentinel());
    }

    #[test]
    fn releases_once_buffer_exceeds_hold() {
        let mut acc = StreamAccumulator::new();
        assert!(acc.push(&delta("The Eiffel")).is_none()); // 10 chars, still held
        let released = acc.push(&delta(" Tower is in Paris.")).unwrap();
        assert_eq!(released, "The Eiffel Tower is in Paris.");
        // Subsequent deltas flow straight through
        assert_eq!(acc.push(&delta(" Yes.")).unwrap(), " Yes.");
        assert!(!acc.is_sentinel());
    }

    #[test]
    fn tail_releases_short_answers() {
        let mut acc = StreamAccumulator::new();
        assert!(acc.push(&delta("Paris.")).is_none());
        assert_eq!(acc.take_tail().unwrap(), "Paris.");
        assert!(acc.take_tail().is_none());
    }

    #[test]
    fn released_concatenation_equals_buffer() {
        let mut acc = StreamAccumulator::new();
        let mut seen = String::new();
        for part in ["It's ", "an ancient ", "analog ", "computer."] {
            if let Some(out) = acc.push(&delta(part)) {
                seen.push_str(&out);
            }
        }
        if let Some(tail) = acc.take_tail() {
            seen.push_str(&tail);
        }
        assert_eq!(seen, acc.text());
        assert_eq!(acc.text(), "It's an ancient analog computer.");
    }

    #[test]
    fn usage_captured_from_any_chunk() {
        let mut acc = StreamAccumulator::new();
        acc.push(&delta("hello"));
        acc.push(&StreamChunk {
            content: None,
            done: true,
            usage: Some(Usage {
                prompt_tokens: 8,
                completion_tokens: 2,
                total_tokens: 10,
            }),
        });
        let reply = acc.finish();
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.usage.unwrap().total_tokens, 10);
    }

    #[test]
    fn usage_may_never_arrive() {
        let mut acc = StreamAccumulator::new();
        acc.push(&delta("hello there, long enough"));
        let reply = acc.finish();
        assert!(reply.usage.is_none());
    }

    #[test]
    fn sentinel_with_surrounding_whitespace_still_detected() {
        let mut acc = StreamAccumulator::new();
        acc.push(&delta(" NEED_WIKI\n"));
        assert!(acc.is_sentinel());
    }

    #[test]
    fn whitespace_padded_sentinel_never_released() {
        // 11 raw chars, but trimmed it is still just the sentinel
        let mut acc = StreamAccumulator::new();
        assert!(acc.push(&delta(" NEED_")).is_none());
        assert!(acc.push(&delta("WIKI\n")).is_none());
        assert!(acc.is_sentinel());
    }

    #[test]
    fn leading_whitespace_does_not_delay_real_answers_forever() {
        let mut acc = StreamAccumulator::new();
        assert!(acc.push(&delta("  The qu")).is_none());
        let out = acc.push(&delta("ark is a particle.")).unwrap();
        assert_eq!(out, "  The quark is a particle.");
    }

    #[test]
    fn sentinel_superstring_is_not_sentinel() {
        let mut acc = StreamAccumulator::new();
        acc.push(&delta("NEED_WIKI please"));
        assert!(!acc.is_sentinel());
    }

    #[test]
    fn multibyte_deltas_release_safely() {
        let mut acc = StreamAccumulator::with_hold(3);
        assert!(acc.push(&delta("日本語")).is_none()); // exactly 3 chars, held
        let out = acc.push(&delta("の答え")).unwrap();
        assert_eq!(out, "日本語の答え");
    }
}
