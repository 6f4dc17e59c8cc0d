//! Shared helpers for integration tests.
//!
//! [`StubService`] is a minimal HTTP/1.1 content service backed by an
//! in-memory corpus. It understands exactly the two requests the crate
//! makes: `GET <base>/<title>` for one document and `GET <base>` for the
//! corpus listing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const BASE_PATH: &str = "/tiddlers";

/// A local content service stub for one test.
pub struct StubService {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StubService {
    /// Spawn a stub serving `corpus` (title -> body) on an ephemeral port.
    pub async fn spawn(corpus: &[(&str, &str)]) -> Self {
        let corpus: Arc<HashMap<String, String>> = Arc::new(
            corpus.iter().map(|(t, b)| (t.to_string(), b.to_string())).collect(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let corpus = corpus.clone();
                tokio::spawn(async move {
                    serve_connection(stream, &corpus).await;
                });
            }
        });

        Self { addr, handle }
    }

    /// Endpoint URL for clients, e.g. `http://127.0.0.1:PORT/tiddlers`.
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.addr, BASE_PATH)
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(mut stream: TcpStream, corpus: &HashMap<String, String>) {
    let mut buf = Vec::new();
    // Read until the end of the request head; these are bodyless GETs.
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => return,
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let (status, body) = route(path, corpus);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn route(path: &str, corpus: &HashMap<String, String>) -> (&'static str, String) {
    if path == BASE_PATH || path == "/tiddlers/" {
        let listing: Vec<serde_json::Value> = corpus
            .keys()
            .map(|title| serde_json::json!({ "title": title }))
            .collect();
        return ("200 OK", serde_json::Value::Array(listing).to_string());
    }

    let Some(encoded) = path.strip_prefix("/tiddlers/") else {
        return ("404 Not Found", String::new());
    };
    let title = percent_decode(encoded);
    match corpus.get(&title) {
        Some(body) => (
            "200 OK",
            serde_json::json!({
                "title": title,
                "text": body,
                "modified": "20240311143059",
                "created": "20240101000000",
            })
            .to_string(),
        ),
        None => ("404 Not Found", String::new()),
    }
}

/// Just enough percent-decoding for the titles these tests use.
fn percent_decode(encoded: &str) -> String {
    encoded.replace("%20", " ").replace("%2F", "/")
}
