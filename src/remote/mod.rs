//! HTTP client for the content service.
//!
//! A [`RemoteClient`] performs the two operations the resolver needs:
//! fetching a single document by title ([`RemoteClient::fetch_one`]) and
//! fetching the corpus-wide listing ([`RemoteClient::fetch_all`]). Every
//! outcome crosses this boundary as either a [`Document`] or a
//! [`FetchError`] carrying the title and cause; nothing panics or leaks a
//! raw transport error past here.
//!
//! The wire format is the service's JSON record shape: `title`, `text`,
//! `modified`/`created` in compact numeric form, and an optional `type`
//! tag. Bulk listings may instead be newline-delimited plain-text titles,
//! which decode to metadata-only documents.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::constants::{CLIENT_USER_AGENT, CONNECT_TIMEOUT, FETCH_TIMEOUT};
use crate::core::{Document, DocumentKind, WikifyError, decode_timestamp_or_now};
use crate::resolver::Fetcher;

/// Header suppressing server-side view wrapping on fetched records.
const CONTROL_VIEW_HEADER: &str = "x-controlview";

/// A failed fetch for one title (or for the corpus listing).
///
/// The resolver maps these onto its failure policy: target failures are
/// session-fatal, dependency failures degrade the closure, and only a
/// transport-level bulk failure aborts a session mid-flight.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service answered with a non-200 status.
    #[error("HTTP {status} fetching '{title}'")]
    Status {
        /// Title (or listing URL) that was requested.
        title: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The request never completed: connection refused, DNS failure,
    /// timeout, or a broken transfer.
    #[error("transport error fetching '{title}': {reason}")]
    Transport {
        /// Title (or listing URL) that was requested.
        title: String,
        /// Underlying transport failure detail.
        reason: String,
    },

    /// The response body could not be decoded into a document record.
    #[error("failed to decode '{title}': {reason}")]
    Decode {
        /// Title (or listing URL) that was requested.
        title: String,
        /// What made the body undecodable.
        reason: String,
    },
}

impl FetchError {
    fn transport(title: &str, error: &reqwest::Error) -> Self {
        Self::Transport {
            title: title.to_string(),
            reason: error.to_string(),
        }
    }

    /// True when the service itself was unreachable, as opposed to
    /// answering with an error or garbage.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Raw JSON record shape used by the content service.
///
/// Timestamps arrive as either strings or bare numbers depending on the
/// deployment, so they are captured loosely and normalized afterwards.
#[derive(Debug, Deserialize)]
struct WireRecord {
    title: Option<String>,
    #[serde(default)]
    text: String,
    modified: Option<serde_json::Value>,
    created: Option<serde_json::Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl WireRecord {
    /// Build a [`Document`], falling back to `requested` when the record
    /// carries no title of its own.
    fn into_document(self, requested: &str) -> Document {
        Document {
            title: self.title.unwrap_or_else(|| requested.to_string()),
            body: self.text,
            kind: DocumentKind::from_wire_type(self.kind.as_deref()),
            created_at: decode_timestamp_or_now(compact_value(&self.created).as_deref()),
            modified_at: decode_timestamp_or_now(compact_value(&self.modified).as_deref()),
        }
    }
}

/// Normalize a loosely typed timestamp value to its compact string form.
fn compact_value(value: &Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a single-document response body.
pub fn decode_document(title: &str, body: &str) -> Result<Document, FetchError> {
    let record: WireRecord =
        serde_json::from_str(body).map_err(|e| FetchError::Decode {
            title: title.to_string(),
            reason: e.to_string(),
        })?;
    Ok(record.into_document(title))
}

/// Decode a corpus listing body.
///
/// A body that looks like JSON must parse as an array of records; anything
/// else is treated as newline-delimited titles. Listings are a metadata
/// index, so every resulting document has an empty body.
pub fn decode_listing(source: &str, body: &str) -> Result<Vec<Document>, FetchError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('[') {
        let records: Vec<WireRecord> =
            serde_json::from_str(body).map_err(|e| FetchError::Decode {
                title: source.to_string(),
                reason: e.to_string(),
            })?;
        Ok(records
            .into_iter()
            .filter(|r| r.title.is_some())
            .map(|mut r| {
                r.text = String::new();
                let title = r.title.clone().unwrap_or_default();
                r.into_document(&title)
            })
            .collect())
    } else {
        Ok(body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|title| Document::markup(title, ""))
            .collect())
    }
}

/// HTTP client bound to one content service endpoint and auth token.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl RemoteClient {
    /// Build a client for `endpoint`, presenting `auth_token` as the session
    /// cookie on every request.
    pub fn new(endpoint: &str, auth_token: &str) -> Result<Self, WikifyError> {
        let endpoint = Url::parse(endpoint).map_err(|e| WikifyError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(WikifyError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(CONTROL_VIEW_HEADER, HeaderValue::from_static("false"));
        if !auth_token.is_empty() {
            let cookie =
                HeaderValue::from_str(auth_token).map_err(|e| WikifyError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: format!("auth token is not a valid header value: {e}"),
                })?;
            headers.insert(COOKIE, cookie);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(FETCH_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| WikifyError::Other {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, endpoint })
    }

    /// The endpoint this client is bound to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL for a single document, with the title percent-encoded as one
    /// path segment.
    fn document_url(&self, title: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(title);
        }
        url
    }

    /// Fetch one document by title.
    pub async fn fetch_one(&self, title: &str) -> Result<Document, FetchError> {
        let url = self.document_url(title);
        tracing::debug!("GET {url}");

        let response =
            self.http.get(url).send().await.map_err(|e| FetchError::transport(title, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("non-200 status {} for '{}'", status.as_u16(), title);
            return Err(FetchError::Status {
                title: title.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::transport(title, &e))?;
        decode_document(title, &body)
    }

    /// Fetch the corpus-wide listing from the endpoint root.
    pub async fn fetch_all(&self) -> Result<Vec<Document>, FetchError> {
        let source = self.endpoint.to_string();
        tracing::debug!("GET {source} (corpus listing)");

        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(&source, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("non-200 status {} for corpus listing", status.as_u16());
            return Err(FetchError::Status {
                title: source,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::transport(&source, &e))?;
        decode_listing(&source, &body)
    }
}

impl Fetcher for RemoteClient {
    fn fetch_one(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Document, FetchError>> + Send {
        Self::fetch_one(self, title)
    }

    fn fetch_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Document>, FetchError>> + Send {
        Self::fetch_all(self)
    }
}
