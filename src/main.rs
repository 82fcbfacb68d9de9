//! Demo server for the SSE emitter.
//!
//! Accepts plain TCP connections, discards the request head, then streams a
//! fixed number of tick events before closing. Each connection gets its own
//! thread and its own emitter instance.
//!
//! # Usage
//!
//! ```bash
//! # Defaults
//! sse-emitter
//!
//! # With config file and overrides
//! SSE_RETRY_MS=2000 sse-emitter config/sse.toml --listen 127.0.0.1:9000
//! ```

use std::io::{self, BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sse_emitter::config::{Config, StreamConfig};
use sse_emitter::{Event, SseStream, TcpSink};

/// Demo server streaming tick events over SSE.
#[derive(Parser, Debug)]
#[command(name = "sse-emitter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Listen address.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Number of events to send per connection.
    #[arg(short = 'n', long, default_value_t = 10)]
    events: u32,

    /// Delay between events (milliseconds).
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_ref())?;
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging)?;

    let listener = TcpListener::bind(&args.listen)?;
    tracing::info!(
        addr = %args.listen,
        events = args.events,
        retry_ms = config.stream.retry_ms,
        "Demo server listening"
    );

    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                let stream_config = config.stream.clone();
                let events = args.events;
                let interval = Duration::from_millis(args.interval_ms);
                thread::spawn(move || {
                    let peer = stream
                        .peer_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    match handle(stream, &stream_config, events, interval) {
                        Ok(()) => tracing::debug!(peer = %peer, "Connection completed"),
                        Err(e) => tracing::warn!(peer = %peer, error = %e, "Connection error"),
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
            }
        }
    }

    Ok(())
}

/// Handle one connection: drain the request head, open a stream, emit ticks.
fn handle(
    stream: TcpStream,
    config: &StreamConfig,
    events: u32,
    interval: Duration,
) -> anyhow::Result<()> {
    drain_request_head(&stream)?;

    let sink = TcpSink::new(stream, config.write_timeout())?;
    let mut sse = SseStream::new(sink);
    sse.open(config.counter_as_id)?;

    for n in 0..events {
        let payload = serde_json::json!({ "tick": n, "of": events }).to_string();
        sse.send(
            &Event::new(&payload)
                .event("tick")
                .retry_ms(config.retry_ms),
        )?;
        thread::sleep(interval);
    }

    // Dropping the sink behind the exit token finalizes the chunked body
    let _exit = sse.finish()?;
    Ok(())
}

/// Read and discard the HTTP request head (request line plus headers).
fn drain_request_head(stream: &TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 || line == "\r\n" || line == "\n" {
            return Ok(());
        }
    }
}

/// Initialize logging with tracing.
fn init_logging(config: &sse_emitter::config::LoggingConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }

    Ok(())
}
