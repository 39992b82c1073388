//! Minimal HTTP/1.1 JSON server for integration tests.
//!
//! Answers every request with `{"method", "path", "body"}` where `body` is the
//! request body parsed as JSON (or null). A path starting with
//! `/delay/<ms>/` is answered after sleeping that long. Behaviour can be
//! bent with [`JsonServerOptions`] to fail, hang or return non-JSON.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonServerOptions {
    /// Answer the first N requests with 500.
    pub fail_first: usize,
    /// Answer every request with this status (and an error body).
    pub always_status: Option<u16>,
    /// Sleep this long before answering every request.
    pub delay: Duration,
    /// Never answer; hold the connection open.
    pub hang: bool,
    /// Answer 200 with this raw body instead of the echo document.
    pub raw_body: Option<&'static str>,
}

pub struct JsonServer {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl JsonServer {
    /// Base URL with trailing slash, e.g. "http://127.0.0.1:12345/".
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn start() -> JsonServer {
    start_with_options(JsonServerOptions::default())
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start_with_options(opts: JsonServerOptions) -> JsonServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || handle(stream, n, opts));
        }
    });
    JsonServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

/// Address that refuses connections: bind, note the port, close.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/gone", port)
}

fn handle(mut stream: TcpStream, nth: usize, opts: JsonServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };
    if opts.hang {
        thread::sleep(Duration::from_secs(30));
        return;
    }
    thread::sleep(opts.delay + path_delay(&path));

    let (status, payload) = if let Some(code) = opts.always_status {
        (code, r#"{"error":"forced"}"#.to_string())
    } else if nth < opts.fail_first {
        (500, r#"{"error":"transient"}"#.to_string())
    } else if let Some(raw) = opts.raw_body {
        (200, raw.to_string())
    } else {
        let body_json: serde_json::Value =
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        let doc = serde_json::json!({ "method": method, "path": path, "body": body_json });
        (200, doc.to_string())
    };
    write_response(&mut stream, status, payload.as_bytes());
}

pub fn write_response<W: Write>(stream: &mut W, status: u16, payload: &[u8]) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        if status < 300 { "OK" } else { "Error" },
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(payload);
    let _ = stream.flush();
}

/// Read request line, headers and a Content-Length body.
/// Returns (method, path, body).
pub fn read_request<R: Read>(stream: &mut R) -> Option<(String, String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&buf[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);
    Some((method, path, body))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// `/delay/250/anything` sleeps 250ms.
fn path_delay(path: &str) -> Duration {
    path.strip_prefix("/delay/")
        .and_then(|rest| rest.split('/').next())
        .and_then(|ms| ms.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}
