//! The document data model shared by the store, the remote client, and the
//! resolver.
//!
//! A [`Document`] is one named unit of content. Titles are the unique keys
//! for every structure in a resolution session: the store is keyed by title,
//! the visited set gates fetches by title, and dependency discovery proposes
//! titles. Once added to a store a document is never mutated for the
//! remainder of the session.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad content classification of a document.
///
/// The content service tags records with a MIME-ish `type` field; anything
/// that identifies itself as code (historically `application/javascript`)
/// is [`Code`](DocumentKind::Code), everything else is treated as wiki
/// markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Wiki markup, the default for fetched records.
    #[default]
    Markup,
    /// Executable or source code content; rendered verbatim, never scanned
    /// for wiki dependencies.
    Code,
}

impl DocumentKind {
    /// Classify a wire-format `type` tag.
    pub fn from_wire_type(wire: Option<&str>) -> Self {
        match wire {
            Some(t) if t.contains("javascript") || t.contains("code") => Self::Code,
            _ => Self::Markup,
        }
    }
}

/// A single named unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique key within a session's store.
    pub title: String,
    /// Full text. Empty for metadata-only records from a bulk listing.
    pub body: String,
    /// Content classification.
    pub kind: DocumentKind,
    /// Creation timestamp reported by the content service.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp reported by the content service.
    pub modified_at: DateTime<Utc>,
}

impl Document {
    /// Create a markup document with both timestamps set to now.
    ///
    /// Primarily useful for tests and locally synthesized content.
    pub fn markup(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            body: body.into(),
            kind: DocumentKind::Markup,
            created_at: now,
            modified_at: now,
        }
    }

    /// True when this record carries no body, only metadata.
    pub fn is_metadata_only(&self) -> bool {
        self.body.is_empty()
    }
}

/// Decode the content service's compact numeric timestamp format.
///
/// The wire format is `YYYYMMDDHHMMSS` with an optional three-digit
/// millisecond suffix (`YYYYMMDDHHMMSSmmm`). A missing or malformed value
/// decodes to `None`; callers substitute the current instant, which is what
/// the service itself does for records that were never saved.
pub fn decode_compact_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // Digit check on the full string first: it rejects signed millisecond
    // suffixes and guarantees every byte is a char boundary before slicing.
    if !matches!(raw.len(), 14 | 17) || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(&raw[..14], "%Y%m%d%H%M%S").ok()?;
    let mut stamp = naive.and_utc();
    if raw.len() == 17 {
        let millis: i64 = raw[14..].parse().ok()?;
        stamp += chrono::Duration::milliseconds(millis);
    }
    Some(stamp)
}

/// Decode an optional compact timestamp, defaulting to the current instant.
pub fn decode_timestamp_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(decode_compact_timestamp).unwrap_or_else(Utc::now)
}
