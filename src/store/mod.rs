//! The per-session content store and the markup engine seam.
//!
//! A [`ContentStore`] holds every document resolved so far for one render
//! request, keyed by title. It owns no parsing or rendering logic itself:
//! a [`MarkupEngine`] is injected at construction, so the engine's
//! capability set (recognized link forms, macros, output format) is
//! configuration rather than a global side effect.
//!
//! One store is scoped to one resolution session and is never shared across
//! concurrent render requests, so no internal locking is needed; the
//! resolver's coordinating task is the only writer.

pub mod engine;

pub use engine::WikiTextEngine;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Document, WikifyError};

/// One dependency declaration discovered by parsing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Title of the required document.
    pub title: String,
    /// Whether dependencies discovered transitively *through* this title
    /// should themselves be expanded. Non-eager dependencies are fetched but
    /// treated as leaves of the closure.
    pub eager: bool,
}

impl Dependency {
    /// Convenience constructor.
    pub fn new(title: impl Into<String>, eager: bool) -> Self {
        Self {
            title: title.into(),
            eager,
        }
    }
}

/// The parse result for one document: which further documents it needs.
///
/// `RequiresAll` is an explicit variant rather than a sentinel title sharing
/// the namespace of real documents; any number of documents may assert it
/// but a session escalates to a bulk fetch at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyDescriptor {
    /// No further documents are required.
    None,
    /// A concrete set of required titles.
    Explicit(Vec<Dependency>),
    /// Rendering needs the entire corpus available from the remote service.
    RequiresAll,
}

/// The parse/render collaborator injected into a [`ContentStore`].
///
/// The resolution core cares only about this interface: `dependencies`
/// reports what a document needs, `render` produces the final output once
/// the closure is materialized. Markup syntax and macro semantics live
/// entirely behind it.
pub trait MarkupEngine: Send + Sync {
    /// Inspect one document's content and report its declared dependencies.
    fn dependencies(&self, document: &Document) -> anyhow::Result<DependencyDescriptor>;

    /// Render the titled document against the store's materialized closure.
    fn render(&self, store: &ContentStore, title: &str) -> anyhow::Result<String>;
}

/// In-memory document store for a single resolution session.
pub struct ContentStore {
    documents: HashMap<String, Document>,
    engine: Arc<dyn MarkupEngine>,
}

impl ContentStore {
    /// Create an empty store backed by the given engine.
    pub fn new(engine: Arc<dyn MarkupEngine>) -> Self {
        Self {
            documents: HashMap::new(),
            engine,
        }
    }

    /// Insert a document, keyed by its title.
    ///
    /// Insertion is additive; re-adding a title replaces the previous record
    /// (the resolver's visited set prevents duplicate fetches by
    /// construction, so this only occurs for deliberate overwrites).
    pub fn add(&mut self, document: Document) {
        self.documents.insert(document.title.clone(), document);
    }

    /// Insert a document only if its title is not already present.
    ///
    /// Used when folding a bulk listing into the store: a metadata-only
    /// record must not clobber a fully fetched body.
    pub fn add_if_absent(&mut self, document: Document) -> bool {
        if self.documents.contains_key(&document.title) {
            return false;
        }
        self.documents.insert(document.title.clone(), document);
        true
    }

    /// Look up a document by title.
    pub fn get(&self, title: &str) -> Option<&Document> {
        self.documents.get(title)
    }

    /// Whether a document with this title has been added.
    pub fn contains(&self, title: &str) -> bool {
        self.documents.contains_key(title)
    }

    /// Number of documents currently held.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Parse the titled document and report its dependency descriptor.
    ///
    /// The document must already have been added; the resolver's call
    /// ordering guarantees this.
    pub fn parse(&self, title: &str) -> Result<DependencyDescriptor, WikifyError> {
        let document = self.documents.get(title).ok_or_else(|| {
            WikifyError::DocumentNotFound {
                title: title.to_string(),
            }
        })?;
        self.engine
            .dependencies(document)
            .map_err(|e| WikifyError::Other {
                message: format!("failed to parse '{title}': {e:#}"),
            })
    }

    /// Render the titled document to final output.
    pub fn render(&self, title: &str) -> Result<String, WikifyError> {
        if !self.documents.contains_key(title) {
            return Err(WikifyError::DocumentNotFound {
                title: title.to_string(),
            });
        }
        self.engine
            .render(self, title)
            .map_err(|e| WikifyError::RenderFailed {
                title: title.to_string(),
                reason: format!("{e:#}"),
            })
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("documents", &self.documents.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine stub with fixed descriptors per title.
    struct StubEngine;

    impl MarkupEngine for StubEngine {
        fn dependencies(&self, document: &Document) -> anyhow::Result<DependencyDescriptor> {
            if document.body.contains("fail-parse") {
                anyhow::bail!("synthetic parse failure");
            }
            Ok(DependencyDescriptor::None)
        }

        fn render(&self, store: &ContentStore, title: &str) -> anyhow::Result<String> {
            let doc = store.get(title).expect("render called for missing title");
            Ok(format!("<html>{}</html>", doc.body))
        }
    }

    fn store() -> ContentStore {
        ContentStore::new(Arc::new(StubEngine))
    }

    #[test]
    fn add_and_lookup() {
        let mut s = store();
        assert!(s.is_empty());
        s.add(Document::markup("A", "alpha"));
        assert!(s.contains("A"));
        assert_eq!(s.get("A").unwrap().body, "alpha");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn add_if_absent_never_clobbers() {
        let mut s = store();
        s.add(Document::markup("A", "full body"));
        let inserted = s.add_if_absent(Document::markup("A", ""));
        assert!(!inserted);
        assert_eq!(s.get("A").unwrap().body, "full body");
    }

    #[test]
    fn parse_missing_document_is_an_error() {
        let s = store();
        let err = s.parse("Nope").unwrap_err();
        assert!(matches!(err, WikifyError::DocumentNotFound { .. }));
    }

    #[test]
    fn parse_failure_is_reported_not_panicked() {
        let mut s = store();
        s.add(Document::markup("Bad", "fail-parse"));
        let err = s.parse("Bad").unwrap_err();
        assert!(err.to_string().contains("Bad"));
    }

    #[test]
    fn render_delegates_to_engine() {
        let mut s = store();
        s.add(Document::markup("A", "alpha"));
        assert_eq!(s.render("A").unwrap(), "<html>alpha</html>");
    }

    #[test]
    fn render_missing_document_is_an_error() {
        let s = store();
        assert!(matches!(
            s.render("Nope").unwrap_err(),
            WikifyError::DocumentNotFound { .. }
        ));
    }
}
