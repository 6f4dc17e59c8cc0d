//! Minimal default markup engine.
//!
//! Real wiki markup and macro semantics belong to a full rendering engine;
//! this built-in implementation recognizes just enough syntax for the binary
//! to be useful end to end:
//!
//! - `[[Title]]` / `[[Display|Title]]` - a link. The linked document is a
//!   dependency but its own dependencies stay unexpanded (non-eager).
//! - `<<tiddler Title>>` - a transclusion. The transcluded document is an
//!   eager dependency: its dependencies are expanded in turn.
//! - `<<list>>` / `<<story>>` - macros whose output depends on the whole
//!   corpus; their presence escalates to [`DependencyDescriptor::RequiresAll`].
//!
//! Code documents are rendered verbatim and never scanned for dependencies.

use regex::Regex;

use crate::core::{Document, DocumentKind};

use super::{ContentStore, Dependency, DependencyDescriptor, MarkupEngine};

/// Transclusion nesting bound during rendering. Missing documents render as
/// placeholders, so this only guards against self-transclusion loops.
const MAX_TRANSCLUSION_DEPTH: usize = 8;

/// The built-in wiki text engine.
pub struct WikiTextEngine {
    link: Regex,
    transclusion: Regex,
    corpus_macro: Regex,
}

impl WikiTextEngine {
    /// Compile the recognizer patterns.
    pub fn new() -> Self {
        Self {
            link: Regex::new(r"\[\[([^\]|]+?)(?:\|([^\]]+?))?\]\]").expect("static link pattern"),
            transclusion: Regex::new(r"<<tiddler\s+([^>]+?)\s*>>")
                .expect("static transclusion pattern"),
            corpus_macro: Regex::new(r"<<(?:list|story)[\s>]").expect("static macro pattern"),
        }
    }

    /// Target title of a `[[...]]` link capture: the part after `|` when a
    /// display form is present, the whole capture otherwise.
    fn link_target<'a>(caps: &'a regex::Captures<'_>) -> &'a str {
        caps.get(2).or_else(|| caps.get(1)).map(|m| m.as_str().trim()).unwrap_or("")
    }

    fn render_body(&self, store: &ContentStore, title: &str, depth: usize) -> String {
        let Some(document) = store.get(title) else {
            return format!("<span class=\"missing\">{title}</span>");
        };
        if document.kind == DocumentKind::Code {
            return format!("<pre>{}</pre>", document.body);
        }

        let with_transclusions =
            self.transclusion.replace_all(&document.body, |caps: &regex::Captures<'_>| {
                let target = caps[1].trim();
                if depth >= MAX_TRANSCLUSION_DEPTH {
                    format!("<span class=\"missing\">{target}</span>")
                } else {
                    self.render_body(store, target, depth + 1)
                }
            });

        self.link
            .replace_all(&with_transclusions, |caps: &regex::Captures<'_>| {
                let target = Self::link_target(caps);
                let display = caps.get(1).map(|m| m.as_str().trim()).unwrap_or(target);
                format!("<a href=\"#{target}\">{display}</a>")
            })
            .into_owned()
    }
}

impl Default for WikiTextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupEngine for WikiTextEngine {
    fn dependencies(&self, document: &Document) -> anyhow::Result<DependencyDescriptor> {
        if document.kind == DocumentKind::Code {
            return Ok(DependencyDescriptor::None);
        }

        if self.corpus_macro.is_match(&document.body) {
            return Ok(DependencyDescriptor::RequiresAll);
        }

        let mut deps: Vec<Dependency> = Vec::new();
        let mut note = |title: &str, eager: bool| {
            if title.is_empty() {
                return;
            }
            match deps.iter_mut().find(|d| d.title == title) {
                // Eagerness unions across mentions within one document too.
                Some(existing) => existing.eager |= eager,
                None => deps.push(Dependency::new(title, eager)),
            }
        };

        for caps in self.transclusion.captures_iter(&document.body) {
            note(caps[1].trim(), true);
        }
        for caps in self.link.captures_iter(&document.body) {
            note(Self::link_target(&caps), false);
        }

        if deps.is_empty() {
            Ok(DependencyDescriptor::None)
        } else {
            Ok(DependencyDescriptor::Explicit(deps))
        }
    }

    fn render(&self, store: &ContentStore, title: &str) -> anyhow::Result<String> {
        let body = self.render_body(store, title, 0);
        Ok(format!("<div class=\"tiddler\" data-title=\"{title}\">{body}</div>"))
    }
}
