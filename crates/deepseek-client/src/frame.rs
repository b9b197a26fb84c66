//! Line decoder for the chat completion stream.
//!
//! The body is a sequence of `data: {json}` lines. Network chunks do not respect line boundaries,
//! so bytes are buffered until a newline and only complete lines are UTF-8 decoded.

use crate::types::ChatChunk;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A content fragment; `finished` when the same frame also carries the end marker.
    Delta { content: String, finished: bool },
    /// End of the response.
    Done,
    /// Well-formed frame without content (keep-alive, role-only delta).
    Heartbeat,
    /// Blank line, SSE comment or non-data field.
    Blank,
    /// The payload could not be parsed; carries the reason.
    Malformed(String),
}

/// Decodes a single line (without its trailing newline).
pub fn decode_line(line: &str) -> Frame {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Frame::Blank;
    }
    if ["event:", "id:", "retry:"].iter().any(|p| line.starts_with(p)) {
        return Frame::Blank;
    }
    let payload = line
        .strip_prefix(DATA_PREFIX)
        .map(str::trim_start)
        .unwrap_or(line);
    if payload == DONE_MARKER {
        return Frame::Done;
    }

    let chunk: ChatChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return Frame::Malformed(e.to_string()),
    };
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Frame::Heartbeat;
    };
    let finished = choice.finish_reason.is_some();
    match choice.delta.and_then(|d| d.content) {
        Some(content) if !content.is_empty() => Frame::Delta { content, finished },
        _ if finished => Frame::Done,
        _ => Frame::Heartbeat,
    }
}

/// Splits a byte stream into lines and decodes each one.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk; returns the frames of every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            frames.push(decode_bytes(&line));
        }
        frames
    }

    /// Decodes whatever is left after the body ended without a final newline.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            self.buf.clear();
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(decode_bytes(&rest))
    }
}

fn decode_bytes(line: &[u8]) -> Frame {
    match std::str::from_utf8(line) {
        Ok(s) => decode_line(s),
        Err(e) => Frame::Malformed(format!("invalid UTF-8: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(s: &str) -> Frame {
        Frame::Delta {
            content: s.to_string(),
            finished: false,
        }
    }

    #[test]
    fn decodes_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert_eq!(decode_line(line), delta("Hi"));
    }

    #[test]
    fn missing_content_is_heartbeat() {
        assert_eq!(
            decode_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            Frame::Heartbeat
        );
        assert_eq!(decode_line(r#"data: {"choices":[]}"#), Frame::Heartbeat);
    }

    #[test]
    fn done_marker_and_finish_reason_end_the_stream() {
        assert_eq!(decode_line("data: [DONE]"), Frame::Done);
        assert_eq!(
            decode_line(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#),
            Frame::Done
        );
        assert_eq!(
            decode_line(r#"data: {"choices":[{"delta":{"content":"!"},"finish_reason":"stop"}]}"#),
            Frame::Delta {
                content: "!".to_string(),
                finished: true
            }
        );
    }

    #[test]
    fn garbage_is_malformed_not_panic() {
        assert!(matches!(decode_line("data: {not json"), Frame::Malformed(_)));
        assert!(matches!(decode_line(r#"data: {"foo":1}"#), Frame::Malformed(_)));
    }

    #[test]
    fn blank_and_sse_fields_are_ignored() {
        assert_eq!(decode_line(""), Frame::Blank);
        assert_eq!(decode_line("   "), Frame::Blank);
        assert_eq!(decode_line(": keep-alive"), Frame::Blank);
        assert_eq!(decode_line("event: message"), Frame::Blank);
    }

    #[test]
    fn decoder_reassembles_lines_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"choices\":[{\"de").is_empty());
        let frames = decoder.push(b"lta\":{\"content\":\"ab\"}}]}\n\ndata: [DONE]\n");
        assert_eq!(frames, vec![delta("ab"), Frame::Blank, Frame::Done]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn decoder_keeps_multibyte_characters_split_across_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n".as_bytes();
        // split inside the two-byte 'é'
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(decoder.push(&line[split..]), vec![delta("héllo")]);
    }

    #[test]
    fn finish_decodes_trailing_line_without_newline() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), Some(Frame::Done));
    }
}
