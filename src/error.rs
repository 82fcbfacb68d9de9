//! Error types for the SSE emitter.

use std::io;
use thiserror::Error;

/// Result type alias for emitter operations.
pub type Result<T> = std::result::Result<T, SseError>;

/// Errors from the stream lifecycle.
///
/// The first three are caller-configuration errors, not transient conditions:
/// the calling context must change (e.g. open the stream before setting other
/// headers) rather than retry.
#[derive(Error, Debug)]
pub enum SseError {
    #[error("response headers already sent, content type can no longer change")]
    HeadersAlreadySent,

    #[error("no interactive HTTP context, an event stream needs a live client connection")]
    NoTransport,

    #[error("a conflicting `Content-Type` header is already queued: {0}")]
    ContentTypeConflict(String),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Errors from the response sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("response headers already sent")]
    HeadersSent,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration loading error.
#[derive(Error, Debug)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);
