//! Blocking TCP response sink.
//!
//! Renders a raw HTTP/1.1 header block and chunked-transfer body framing
//! directly onto a `TcpStream`, with a per-write timeout.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use super::ResponseSink;
use crate::error::SinkError;

/// Response sink over a connected `TcpStream`.
///
/// Body writes are buffered in an application buffer until `flush_app`; if a
/// `Transfer-Encoding: chunked` header was queued, each `write` becomes one
/// chunk. [`TcpSink::finish`] emits the terminal chunk and shuts the write
/// side down; dropping the sink does the same best-effort.
pub struct TcpSink {
    stream: TcpStream,
    headers: Vec<(String, String)>,
    buf: Vec<u8>,
    headers_sent: bool,
    chunked: bool,
    finished: bool,
    bytes_written: u64,
}

impl TcpSink {
    /// Wrap a connected stream, applying `write_timeout` to every write.
    pub fn new(stream: TcpStream, write_timeout: Duration) -> io::Result<Self> {
        stream.set_write_timeout(Some(write_timeout))?;
        Ok(Self {
            stream,
            headers: Vec::new(),
            buf: Vec::new(),
            headers_sent: false,
            chunked: false,
            finished: false,
            bytes_written: 0,
        })
    }

    /// Total body-layer bytes pushed to the socket.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush pending output, terminate the chunked body, and shut down the
    /// write side of the connection.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        if self.headers_sent {
            if !self.buf.is_empty() {
                let buf = std::mem::take(&mut self.buf);
                self.write_out(&buf)?;
            }
            if self.chunked {
                self.write_out(b"0\r\n\r\n")?;
            }
            self.stream.flush()?;
        }
        self.stream.shutdown(Shutdown::Write)
    }

    fn write_out(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Write the status line and queued headers. Chunked framing is enabled
    /// when a `Transfer-Encoding: chunked` header was queued.
    fn send_header_block(&mut self) -> io::Result<()> {
        let mut block = String::from("HTTP/1.1 200 OK\r\n");
        for (name, value) in &self.headers {
            block.push_str(name);
            block.push_str(": ");
            block.push_str(value);
            block.push_str("\r\n");
        }
        block.push_str("\r\n");

        self.chunked = self.headers.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case("transfer-encoding")
                && value.trim().eq_ignore_ascii_case("chunked")
        });

        self.stream.write_all(block.as_bytes())?;
        self.headers_sent = true;
        tracing::debug!(headers = self.headers.len(), chunked = self.chunked, "header block sent");
        Ok(())
    }
}

impl ResponseSink for TcpSink {
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
        if !self.headers_sent {
            self.send_header_block()?;
        }
        // A zero-length chunk would terminate the body early
        if data.is_empty() {
            return Ok(());
        }
        if self.chunked {
            self.buf
                .extend_from_slice(format!("{:X}\r\n", data.len()).as_bytes());
            self.buf.extend_from_slice(data);
            self.buf.extend_from_slice(b"\r\n");
        } else {
            self.buf.extend_from_slice(data);
        }
        Ok(())
    }

    fn flush_app(&mut self) -> Result<(), SinkError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.buf);
        self.write_out(&buf)?;
        Ok(())
    }

    fn flush_transport(&mut self) -> Result<(), SinkError> {
        self.stream.flush()?;
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        self.stream.peer_addr().is_ok()
    }

    fn disable_abort_on_disconnect(&mut self) {
        // Nothing to disable on a raw socket: a vanished client shows up as
        // a write error on a later send, which is the behavior callers want.
        tracing::trace!("abort-on-disconnect hint is a no-op for raw TCP");
    }
}

impl Drop for TcpSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::debug!(error = %e, "error finalizing connection on drop");
        }
    }
}
