//! Minimal Server-Sent Events emitter.
//!
//! Verifies an HTTP response can legally become an event stream, switches it
//! into streaming mode, and formats/flushes discrete events until the
//! connection closes. The hosting server, routing, and the choice of what to
//! send stay outside; the response is reached only through the
//! [`sink::ResponseSink`] trait.

pub mod config;
pub mod error;
pub mod sink;
pub mod streaming;

pub use config::Config;
pub use error::{Result, SinkError, SseError};
pub use sink::{BufferSink, ResponseSink, TcpSink};
pub use streaming::{Event, HandlerExit, IdMode, SseStream, DEFAULT_RETRY_MS};
