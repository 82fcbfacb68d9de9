//! Stream lifecycle: feasibility check, open, send, close.

use std::sync::OnceLock;
use std::time::Instant;

use crate::error::{SinkError, SseError};
use crate::sink::ResponseSink;

use super::encode::{encode_frame, sanitize_field, Event};

/// How auto-generated event IDs are produced. Chosen at `open` time and
/// immutable until the next `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMode {
    /// Sequential counter starting at 0, restarted by every `open`.
    Counter,
    /// Nanosecond-scale monotonic timestamp.
    HighResTime,
}

/// Token returned by [`SseStream::finish`].
///
/// Signals that handler execution should stop. Propagate it up to the request
/// dispatcher (e.g. as a handler return value) instead of continuing to run
/// handler code after the stream has ended.
#[must_use = "propagate this to the request dispatcher to stop handler execution"]
#[derive(Debug)]
pub struct HandlerExit(());

/// Stateful SSE emitter bound to one outbound HTTP response.
///
/// Control flow is sequential and caller-driven: optionally
/// [`is_possible`](Self::is_possible), then [`open`](Self::open), then
/// [`send`](Self::send) zero or more times, then [`close`](Self::close) or
/// [`finish`](Self::finish). One instance per in-flight response; never share
/// an instance across responses, or ID and flag state will interleave.
pub struct SseStream<S: ResponseSink> {
    sink: S,
    /// Cached feasibility. Only a `true` result is cached; conditions behind
    /// a `false` can still change before headers go out.
    possible: bool,
    open: bool,
    id_mode: IdMode,
    counter: u64,
}

impl<S: ResponseSink> SseStream<S> {
    /// Bind an emitter to a response sink.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            possible: false,
            open: false,
            id_mode: IdMode::HighResTime,
            counter: 0,
        }
    }

    /// Whether streaming headers have been emitted.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give the sink back, discarding stream state.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Whether the response can still be turned into an event stream.
    ///
    /// No side effects beyond caching a `true` result.
    pub fn is_possible(&mut self) -> bool {
        self.check_possible().is_ok()
    }

    /// Like [`is_possible`](Self::is_possible), but fails with the specific
    /// reason streaming is off the table.
    pub fn ensure_possible(&mut self) -> Result<(), SseError> {
        self.check_possible()
    }

    fn check_possible(&mut self) -> Result<(), SseError> {
        // Once bytes are on the wire the content type cannot change
        if self.sink.headers_sent() {
            return Err(SseError::HeadersAlreadySent);
        }
        if self.possible || self.open {
            return Ok(());
        }
        if !self.sink.is_interactive() {
            return Err(SseError::NoTransport);
        }
        for header in self.sink.queued_headers() {
            let Some(value) = header_value(&header, "Content-Type") else {
                continue;
            };
            if value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("text/event-stream")
            {
                self.possible = true;
                return Ok(());
            }
            // Another component already claimed the content type
            return Err(SseError::ContentTypeConflict(value.trim().to_string()));
        }
        self.possible = true;
        Ok(())
    }

    /// Transition the response into streaming mode.
    ///
    /// Header emission is idempotent, but ID generation is reconfigured on
    /// every call: the counter restarts and `counter_as_id` picks between
    /// [`IdMode::Counter`] and [`IdMode::HighResTime`], even mid-stream.
    pub fn open(&mut self, counter_as_id: bool) -> Result<(), SseError> {
        self.counter = 0;
        self.id_mode = if counter_as_id {
            IdMode::Counter
        } else {
            IdMode::HighResTime
        };
        // Disconnects are surfaced through write failures, not aborts
        self.sink.disable_abort_on_disconnect();
        self.check_possible()?;
        if !self.open {
            self.sink.set_header("Content-Type", "text/event-stream")?;
            self.sink.set_header("Transfer-Encoding", "chunked")?;
            self.sink.set_header("Cache-Control", "no-cache")?;
            self.open = true;
            tracing::debug!(id_mode = ?self.id_mode, "event stream opened");
        }
        Ok(())
    }

    /// Format one event frame, write it, and flush both buffer layers so the
    /// client receives it without delay.
    ///
    /// Precondition: [`open`](Self::open) has succeeded. Calling `send`
    /// before opening writes a frame onto a response that never got streaming
    /// headers; the result is not a valid event stream.
    pub fn send(&mut self, event: &Event<'_>) -> Result<(), SseError> {
        let id = self.derive_id(event.id);
        let name = sanitize_field(event.event);
        let message = sanitize_field(event.message);
        let frame = encode_frame(event.retry_ms, &id, &name, &message);
        self.sink.write(&frame)?;
        self.sink.flush_app()?;
        self.sink.flush_transport()?;
        tracing::trace!(id = %id, bytes = frame.len(), "event flushed");
        Ok(())
    }

    /// Send a bare message with default event name, retry, and ID.
    pub fn send_message(&mut self, message: &str) -> Result<(), SseError> {
        self.send(&Event::new(message))
    }

    /// Signal end of stream and return control to the caller.
    ///
    /// The stream should be considered finished afterwards, though the caller
    /// may continue unrelated work on the response context.
    pub fn close(&mut self) -> Result<(), SseError> {
        self.queue_connection_close()?;
        tracing::debug!("event stream closed");
        Ok(())
    }

    /// Signal end of stream and end handler execution.
    ///
    /// Consumes the emitter and returns a [`HandlerExit`] token for the
    /// request dispatcher; no further events can be sent.
    pub fn finish(mut self) -> Result<HandlerExit, SseError> {
        self.queue_connection_close()?;
        tracing::debug!("event stream finished");
        Ok(HandlerExit(()))
    }

    fn queue_connection_close(&mut self) -> Result<(), SseError> {
        match self.sink.set_header("Connection", "close") {
            // Expected on a stream that already began transmitting: the
            // trailing header simply cannot be added any more.
            Err(SinkError::HeadersSent) => Ok(()),
            other => other.map_err(SseError::from),
        }
    }

    fn derive_id(&mut self, explicit: Option<&str>) -> String {
        match explicit {
            Some(id) if !id.trim().is_empty() => sanitize_field(id),
            _ => match self.id_mode {
                IdMode::Counter => {
                    let id = self.counter;
                    self.counter += 1;
                    id.to_string()
                }
                IdMode::HighResTime => hrtime_nanos().to_string(),
            },
        }
    }
}

/// Nanoseconds on a monotonic clock with an arbitrary process-local origin.
fn hrtime_nanos() -> u128 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_nanos()
}

/// Extract the value of `name` from a raw `Name: value` header string.
fn header_value<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let (header_name, value) = raw.split_once(':')?;
    if header_name.trim().eq_ignore_ascii_case(name) {
        Some(value)
    } else {
        None
    }
}
