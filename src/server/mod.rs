//! Unix-domain-socket front end.
//!
//! Each connection carries one render request: a NUL-separated record of
//! `[title, endpoint, auth_token?]`, terminated by the client shutting down
//! its write side. The listener runs one resolution session per connection,
//! writes the rendered output (or an error string) back on the same
//! connection, and closes it. Connection concurrency is bounded by a
//! semaphore; excess connections wait in the accept backlog.
//!
//! Sessions are independent: each request gets its own store and remote
//! client, so nothing persists between connections.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;

use crate::core::WikifyError;
use crate::remote::RemoteClient;
use crate::resolver::{SessionReport, render_document};
use crate::store::{MarkupEngine, WikiTextEngine};

/// One decoded socket request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Title of the document to render.
    pub title: String,
    /// Content service endpoint to resolve against.
    pub endpoint: String,
    /// Auth token presented as the session cookie; may be empty.
    pub auth_token: String,
}

/// Decode a raw connection payload into a [`RenderRequest`].
///
/// The wire shape is `title NUL endpoint [NUL auth_token]` with any trailing
/// CR/LF stripped, exactly what the historical clients send.
pub fn parse_request(raw: &[u8]) -> Result<RenderRequest, WikifyError> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches(['\r', '\n']);
    let mut parts = text.split('\0');

    let title = parts.next().unwrap_or_default();
    if title.is_empty() {
        return Err(WikifyError::MalformedRequest {
            reason: "missing title".to_string(),
        });
    }
    let endpoint = parts.next().unwrap_or_default();
    if endpoint.is_empty() {
        return Err(WikifyError::MalformedRequest {
            reason: "missing endpoint".to_string(),
        });
    }
    let auth_token = parts.next().unwrap_or_default();

    Ok(RenderRequest {
        title: title.to_string(),
        endpoint: endpoint.to_string(),
        auth_token: auth_token.to_string(),
    })
}

/// Run one resolution session for a decoded payload.
pub async fn handle_request(raw: &[u8]) -> Result<SessionReport, WikifyError> {
    let request = parse_request(raw)?;
    tracing::info!("attempting render of '{}' in {}", request.title, request.endpoint);

    let client = RemoteClient::new(&request.endpoint, &request.auth_token)?;
    let engine: Arc<dyn MarkupEngine> = Arc::new(WikiTextEngine::new());
    render_document(&client, engine, &request.title).await
}

async fn handle_connection(mut stream: UnixStream) {
    let mut raw = Vec::new();
    if let Err(e) = stream.read_to_end(&mut raw).await {
        tracing::warn!("failed to read request: {e}");
        return;
    }

    let response = match handle_request(&raw).await {
        Ok(report) => {
            if let Some(reason) = &report.bulk_failure {
                tracing::warn!("rendered without the full corpus listing: {reason}");
            }
            if !report.failed.is_empty() {
                tracing::warn!(
                    "render completed degraded; missing dependencies: {:?}",
                    report.failed
                );
            }
            report.output
        }
        Err(e) => {
            tracing::error!("error on render: {e}");
            format!("error attempting to render: {e}")
        }
    };

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::warn!("failed to write response: {e}");
    }
    let _ = stream.shutdown().await;
}

/// Listen on `socket` and serve render requests until the listener fails.
///
/// A stale socket file from a previous run is removed before binding. At
/// most `max_connections` connections are serviced concurrently.
pub async fn serve(socket: &Path, max_connections: usize) -> Result<(), WikifyError> {
    if socket.exists() {
        std::fs::remove_file(socket)?;
    }
    let listener = UnixListener::bind(socket)?;
    tracing::info!("listening on {}", socket.display());

    let limit = Arc::new(Semaphore::new(max_connections));
    loop {
        let (stream, _addr) = listener.accept().await?;
        let Ok(permit) = limit.clone().acquire_owned().await else {
            // Semaphore closed; shutting down.
            return Ok(());
        };
        tokio::spawn(async move {
            let _permit = permit;
            handle_connection(stream).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_request() {
        let raw = b"HelloThere\0http://wiki.example/tiddlers\0session=abc\n";
        let request = parse_request(raw).unwrap();
        assert_eq!(
            request,
            RenderRequest {
                title: "HelloThere".to_string(),
                endpoint: "http://wiki.example/tiddlers".to_string(),
                auth_token: "session=abc".to_string(),
            }
        );
    }

    #[test]
    fn auth_token_is_optional() {
        let request = parse_request(b"Title\0http://wiki.example").unwrap();
        assert_eq!(request.auth_token, "");
    }

    #[test]
    fn trailing_newlines_are_stripped() {
        let request = parse_request(b"Title\0http://wiki.example\r\n\r\n").unwrap();
        assert_eq!(request.endpoint, "http://wiki.example");
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(matches!(
            parse_request(b"").unwrap_err(),
            WikifyError::MalformedRequest { .. }
        ));
        assert!(matches!(
            parse_request(b"TitleOnly").unwrap_err(),
            WikifyError::MalformedRequest { .. }
        ));
        assert!(matches!(
            parse_request(b"Title\0").unwrap_err(),
            WikifyError::MalformedRequest { .. }
        ));
    }
}
