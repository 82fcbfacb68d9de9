//! SSE wire-format encoding.

use bytes::Bytes;

/// Default client reconnect interval in milliseconds.
pub const DEFAULT_RETRY_MS: u32 = 10_000;

/// One outbound event.
///
/// Built per send and never stored; sanitization happens at send time, so the
/// builder accepts raw caller input.
#[derive(Debug, Clone)]
pub struct Event<'a> {
    pub(crate) message: &'a str,
    pub(crate) event: &'a str,
    pub(crate) retry_ms: u32,
    pub(crate) id: Option<&'a str>,
}

impl<'a> Event<'a> {
    /// Create an event carrying `message`, with no event name, the default
    /// retry interval, and an auto-generated ID.
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            event: "",
            retry_ms: DEFAULT_RETRY_MS,
            id: None,
        }
    }

    /// Set the event name. An empty name omits the `event:` line entirely.
    pub fn event(mut self, event: &'a str) -> Self {
        self.event = event;
        self
    }

    /// Set the reconnect interval in milliseconds.
    pub fn retry_ms(mut self, retry_ms: u32) -> Self {
        self.retry_ms = retry_ms;
        self
    }

    /// Set an explicit event ID. A blank or whitespace-only ID falls back to
    /// auto-generation.
    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }
}

/// Strip CR/LF and trim surrounding whitespace.
///
/// Field values must not contain line breaks on the wire; a stray `\n` in
/// caller input would otherwise split the frame.
pub(crate) fn sanitize_field(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    stripped.trim().to_string()
}

/// Encode one frame. Inputs must already be sanitized.
///
/// Lines end with `\n` and the frame ends with a blank line; the `event:`
/// line is omitted when the name is empty.
pub(crate) fn encode_frame(retry_ms: u32, id: &str, event: &str, message: &str) -> Bytes {
    let frame = if event.is_empty() {
        format!("retry: {}\nid: {}\ndata: {}\n\n", retry_ms, id, message)
    } else {
        format!(
            "retry: {}\nid: {}\nevent: {}\ndata: {}\n\n",
            retry_ms, id, event, message
        )
    };
    frame.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_without_event() {
        let frame = encode_frame(10_000, "7", "", "hello");
        assert_eq!(frame.as_ref(), b"retry: 10000\nid: 7\ndata: hello\n\n");
    }

    #[test]
    fn test_encode_frame_with_event() {
        let frame = encode_frame(5000, "42", "ping", "hi");
        assert_eq!(frame.as_ref(), b"retry: 5000\nid: 42\nevent: ping\ndata: hi\n\n");
    }

    #[test]
    fn test_sanitize_strips_line_breaks() {
        assert_eq!(sanitize_field("a\r\nb\nc"), "abc");
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        assert_eq!(sanitize_field("  padded \t"), "padded");
        assert_eq!(sanitize_field("\r\n"), "");
    }
}
