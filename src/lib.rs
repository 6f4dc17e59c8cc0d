//! wikify - render remote wiki documents by resolving their transitive
//! dependency closure.
//!
//! Given a document title and a content service endpoint, wikify fetches the
//! target document, discovers the documents it depends on, fetches those
//! concurrently (and their dependencies in turn), and renders the target
//! once the full closure is materialized locally. The render step fires
//! exactly once per request, regardless of how fetches interleave.
//!
//! # Architecture
//!
//! - [`resolver`] - the dependency-closure resolution engine: one
//!   coordinating task per session owns all resolution state and fans out
//!   bounded concurrent fetches. The only genuinely stateful part of the
//!   crate, and deliberately the only one.
//! - [`remote`] - HTTP client for the content service: single-document
//!   fetch, corpus-wide listing fetch, wire-format decoding.
//! - [`store`] - the per-session document store and the [`store::MarkupEngine`]
//!   seam behind which parsing and rendering live.
//! - [`core`] - the [`core::Document`] data model and the error taxonomy.
//! - [`server`] - Unix-domain-socket front end (Unix only).
//! - [`cli`] - the `wikify render` and `wikify serve` commands.
//!
//! # Example
//!
//! ```bash
//! # One-shot render to stdout
//! wikify render HelloThere http://wiki.example/bags/common/tiddlers
//!
//! # Long-running socket front end
//! wikify serve --socket /tmp/wikify.sock --max-connections 20
//! ```
//!
//! Failure policy: a fetch failure for the *target* document fails the
//! request; a fetch failure for any dependency merely degrades the rendered
//! closure and is reported, never fatal.

pub mod cli;
pub mod constants;
pub mod core;
pub mod remote;
pub mod resolver;
#[cfg(unix)]
pub mod server;
pub mod store;
