//! SSE streaming: wire-format encoding and the stream emitter.

mod emitter;
mod encode;

pub use emitter::{HandlerExit, IdMode, SseStream};
pub use encode::{Event, DEFAULT_RETRY_MS};
