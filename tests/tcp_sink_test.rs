//! Integration test streaming over a real loopback TCP connection.

use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use sse_emitter::{Event, SseStream, TcpSink};

/// De-chunk a `Transfer-Encoding: chunked` body, returning the payload and
/// the number of non-terminal chunks.
fn dechunk(mut body: &[u8]) -> (Vec<u8>, usize) {
    let mut out = Vec::new();
    let mut chunks = 0;
    loop {
        let line_end = body
            .windows(2)
            .position(|w| w == b"\r\n")
            .expect("chunk size line");
        let size_line = std::str::from_utf8(&body[..line_end]).unwrap();
        let size = usize::from_str_radix(size_line, 16).expect("hex chunk size");
        body = &body[line_end + 2..];
        if size == 0 {
            break;
        }
        out.extend_from_slice(&body[..size]);
        assert_eq!(&body[size..size + 2], b"\r\n");
        body = &body[size + 2..];
        chunks += 1;
    }
    (out, chunks)
}

fn stream_over_loopback<F>(serve: F) -> Vec<u8>
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (conn, _) = listener.accept().unwrap();
        serve(conn);
    });

    let mut client = TcpStream::connect(addr).unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).unwrap();
    server.join().unwrap();
    response
}

#[test]
fn test_streams_valid_http_response_over_tcp() {
    let response = stream_over_loopback(|conn| {
        let sink = TcpSink::new(conn, Duration::from_secs(5)).unwrap();
        let mut sse = SseStream::new(sink);
        sse.open(true).unwrap();
        sse.send(&Event::new("hello").event("greeting").retry_ms(2000))
            .unwrap();
        sse.send_message("world").unwrap();
        let _exit = sse.finish().unwrap();
    });

    let head_end = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header block terminator");
    let head = std::str::from_utf8(&response[..head_end]).unwrap();
    let body = &response[head_end + 4..];

    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: text/event-stream\r\n"));
    assert!(head.contains("Transfer-Encoding: chunked\r\n"));
    assert!(head.contains("Cache-Control: no-cache"));

    let (payload, chunks) = dechunk(body);
    // One chunk per event, plus the terminal chunk consumed by dechunk
    assert_eq!(chunks, 2);
    assert_eq!(
        String::from_utf8(payload).unwrap(),
        "retry: 2000\nid: 0\nevent: greeting\ndata: hello\n\n\
         retry: 10000\nid: 1\ndata: world\n\n"
    );
}

#[test]
fn test_connected_socket_counts_as_interactive() {
    let response = stream_over_loopback(|conn| {
        let sink = TcpSink::new(conn, Duration::from_secs(5)).unwrap();
        let mut sse = SseStream::new(sink);
        assert!(sse.is_possible());
        sse.open(false).unwrap();
        sse.send_message("only").unwrap();
        // Dropping the emitter finalizes the chunked body
    });

    let text = String::from_utf8_lossy(&response);
    assert!(text.contains("data: only\n\n"));
    // Terminal chunk present even without an explicit finish
    assert!(text.ends_with("0\r\n\r\n"));
}

#[test]
fn test_bytes_written_tracks_body_layer() {
    let response = stream_over_loopback(|conn| {
        let mut sink = TcpSink::new(conn, Duration::from_secs(5)).unwrap();
        assert_eq!(sink.bytes_written(), 0);
        let mut sse = SseStream::new(sink);
        sse.open(true).unwrap();
        sse.send_message("x").unwrap();
        sink = sse.into_sink();
        assert!(sink.bytes_written() > 0);
        sink.finish().unwrap();
    });

    assert!(!response.is_empty());
}
