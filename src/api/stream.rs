use super::logging::emit_sse_parse_error;
use crate::types::{SseFrame, StreamEvent};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Line-oriented decoder for the query stream.
///
/// Network chunks do not line up with `data:` lines, so undecoded bytes are
/// kept between calls and only complete lines are parsed. Bytes rather than
/// text are buffered so a UTF-8 sequence split across chunks survives.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let line_end = start + offset;
            if let Some(frame) = decode_line(&self.buffer[start..line_end]) {
                frames.push(frame);
            }
            start = line_end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        frames
    }

    /// Decodes whatever is left once the byte stream has closed.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<SseFrame> {
    let line = String::from_utf8_lossy(raw);
    let line = line.strip_suffix('\r').unwrap_or(&line);
    let data = line.strip_prefix(DATA_PREFIX)?;

    if data == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(SseFrame::Event(event)),
        Err(error) => {
            emit_sse_parse_error(data, &error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_line_endings_are_accepted() {
        let mut parser = StreamParser::new();
        let frames = parser.process(b"data: {\"data\":{\"route\":\"tool_finder\"}}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            SseFrame::Event(event) => {
                let payload = event.data.as_ref().expect("payload");
                assert_eq!(payload.route.as_deref(), Some("tool_finder"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_partial_line_is_retained_until_newline() {
        let mut parser = StreamParser::new();
        assert!(parser.process(b"data: {\"node\":").is_empty());
        assert!(parser.pending_bytes() > 0);
        let frames = parser.process(b"\"supervisor\"}\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(parser.pending_bytes(), 0);
    }

    #[test]
    fn test_finish_decodes_unterminated_last_line() {
        let mut parser = StreamParser::new();
        assert!(parser.process(b"data: [DONE]").is_empty());
        assert_eq!(parser.finish(), Some(SseFrame::Done));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_data_prefix_requires_space() {
        let mut parser = StreamParser::new();
        let frames = parser.process(b"data:{\"node\":\"x\"}\n: keep-alive\nevent: update\n\n");
        assert!(frames.is_empty());
    }
}
