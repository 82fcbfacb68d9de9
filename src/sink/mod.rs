//! Response sink abstraction and concrete sinks.

mod buffer;
mod tcp;

pub use buffer::BufferSink;
pub use tcp::TcpSink;

use crate::error::SinkError;

/// The outbound HTTP response as seen by the emitter.
///
/// One sink is bound to exactly one in-flight response. Headers queue until
/// the first body write, which flushes the header block to the transport;
/// after that point headers are immutable.
pub trait ResponseSink {
    /// Whether the header block has been physically written to the transport.
    fn headers_sent(&self) -> bool;

    /// Headers queued but not yet sent, as raw `Name: value` strings in
    /// insertion order. Empty once the header block is on the wire.
    fn queued_headers(&self) -> Vec<String>;

    /// Queue a header. Fails with [`SinkError::HeadersSent`] once the header
    /// block is on the wire; callers decide whether that failure is
    /// ignorable at their call site.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), SinkError>;

    /// Append body bytes, flushing the queued header block first if pending.
    fn write(&mut self, data: &[u8]) -> Result<(), SinkError>;

    /// Flush the application-level buffer toward the transport.
    fn flush_app(&mut self) -> Result<(), SinkError>;

    /// Flush the transport-level buffer toward the client.
    ///
    /// Many HTTP stacks buffer independently at two layers, so both flushes
    /// are required for an event to leave the machine without delay.
    fn flush_transport(&mut self) -> Result<(), SinkError>;

    /// Whether a real HTTP client is on the other end, as opposed to a
    /// command-line or test context with no live connection.
    fn is_interactive(&self) -> bool;

    /// Best-effort hint to keep the response alive past client disconnect,
    /// so partial writes after disconnect surface as ordinary write errors
    /// instead of aborting the handler.
    fn disable_abort_on_disconnect(&mut self);
}
