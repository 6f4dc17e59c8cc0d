//! Core types and error handling for wikify.
//!
//! This module holds the pieces everything else builds on: the
//! [`Document`] data model, the compact timestamp codec used by the wire
//! format, and the error taxonomy with its user-facing display layer.

pub mod document;
pub mod error;

pub use document::{
    decode_compact_timestamp, decode_timestamp_or_now, Document, DocumentKind,
};
pub use error::{user_friendly_error, ErrorContext, WikifyError};
