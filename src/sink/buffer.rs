//! In-memory response sink.
//!
//! Records headers and body without any transport, for tests and for hosts
//! that assemble the response themselves.

use super::ResponseSink;
use crate::error::SinkError;

/// Sink that records everything in memory.
///
/// The feasibility inputs (`headers_sent`, interactivity) are scriptable so
/// every lifecycle branch can be driven from a test.
#[derive(Debug, Default)]
pub struct BufferSink {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    headers_sent: bool,
    non_interactive: bool,
    abort_disabled: bool,
    app_flushes: usize,
    transport_flushes: usize,
}

impl BufferSink {
    /// Create an empty sink behaving like a live client connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the header block already hit the wire.
    pub fn mark_headers_sent(&mut self) {
        self.headers_sent = true;
    }

    /// Simulate a context with no live HTTP client.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.non_interactive = !interactive;
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as a string, lossy on invalid UTF-8.
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Headers queued or sent, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Number of application-buffer flushes observed.
    pub fn app_flushes(&self) -> usize {
        self.app_flushes
    }

    /// Number of transport-buffer flushes observed.
    pub fn transport_flushes(&self) -> usize {
        self.transport_flushes
    }

    /// Whether the abort-on-disconnect hint was given.
    pub fn abort_on_disconnect_disabled(&self) -> bool {
        self.abort_disabled
    }
}

impl ResponseSink for BufferSink {
    fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    fn queued_headers(&self) -> Vec<String> {
        if self.headers_sent {
            return Vec::new();
        }
        self.headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect()
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        if self.headers_sent {
            return Err(SinkError::HeadersSent);
        }
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), SinkError> {
        // First body byte commits the header block
        self.headers_sent = true;
        self.body.extend_from_slice(data);
        Ok(())
    }

    fn flush_app(&mut self) -> Result<(), SinkError> {
        self.app_flushes += 1;
        Ok(())
    }

    fn flush_transport(&mut self) -> Result<(), SinkError> {
        self.transport_flushes += 1;
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        !self.non_interactive
    }

    fn disable_abort_on_disconnect(&mut self) {
        self.abort_disabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_queue_until_first_write() {
        let mut sink = BufferSink::new();
        sink.set_header("Content-Type", "text/event-stream").unwrap();
        assert!(!sink.headers_sent());
        assert_eq!(sink.queued_headers(), vec!["Content-Type: text/event-stream"]);

        sink.write(b"data: x\n\n").unwrap();
        assert!(sink.headers_sent());
        assert!(sink.queued_headers().is_empty());
    }

    #[test]
    fn test_set_header_after_send_fails() {
        let mut sink = BufferSink::new();
        sink.mark_headers_sent();
        let err = sink.set_header("Connection", "close").unwrap_err();
        assert!(matches!(err, SinkError::HeadersSent));
    }

    #[test]
    fn test_flush_counters() {
        let mut sink = BufferSink::new();
        sink.flush_app().unwrap();
        sink.flush_transport().unwrap();
        sink.flush_transport().unwrap();
        assert_eq!(sink.app_flushes(), 1);
        assert_eq!(sink.transport_flushes(), 2);
    }
}
