//! The dependency-closure resolution engine.
//!
//! Given a target title, a [`ResolutionSession`] fetches the target, parses
//! it for dependencies, fans out concurrent fetches for every newly
//! discovered title, folds each fetch's own discoveries back into the
//! frontier, and renders exactly once when the closure is stable: frontier
//! empty, nothing in flight, no bulk fetch pending.
//!
//! # Concurrency model
//!
//! All session state (`visited`, `frontier`, `eager`, `failed`, the bulk
//! flags) is owned by the single coordinating task running
//! [`ResolutionSession::run`]. Fetches execute concurrently as futures in a
//! [`FuturesUnordered`] set that only the coordinator polls, so every
//! completion arrives as a message on the coordinator's schedule and no
//! mutation ever races a callback. There is no separately maintained
//! outstanding-work counter to drift out of sync: the in-flight set itself
//! is the authoritative count, and the completion check runs only between
//! settlements.
//!
//! Fan-out within a round is bounded by
//! [`MAX_CONCURRENT_FETCHES`](crate::constants::MAX_CONCURRENT_FETCHES).
//! Dropping the `run` future drops the in-flight set with it; abandoned
//! fetches resolve nowhere and never touch session state.
//!
//! # Failure policy
//!
//! Only two failures end a session: the target's own fetch, and a
//! transport-level failure of the bulk corpus fetch. Every other fetch or
//! parse failure is logged, recorded in the session report, and absorbed -
//! the closure degrades but the render still fires.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use crate::constants::MAX_CONCURRENT_FETCHES;
use crate::core::{Document, WikifyError};
use crate::remote::FetchError;
use crate::store::{ContentStore, DependencyDescriptor, MarkupEngine};

/// The fetch seam between the resolver and the content service.
///
/// [`RemoteClient`](crate::remote::RemoteClient) is the production
/// implementation; tests drive the resolver with in-memory fetchers that
/// control completion order and failure injection.
pub trait Fetcher: Send + Sync {
    /// Fetch one document by title.
    fn fetch_one(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Document, FetchError>> + Send;

    /// Fetch the corpus-wide metadata listing.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Document>, FetchError>> + Send;
}

/// Outcome of one completed session.
#[derive(Debug)]
pub struct SessionReport {
    /// The rendered output for the target document.
    pub output: String,
    /// Number of documents materialized in the store, target included.
    pub resolved: usize,
    /// Titles whose fetch or parse failed; absent from the closure.
    pub failed: Vec<String>,
    /// External-scheme titles that were recorded but never fetched.
    pub external: Vec<String>,
    /// Error detail when the corpus listing fetch degraded the session
    /// instead of failing it.
    pub bulk_failure: Option<String>,
}

/// State for one render request, from target selection to the single
/// completion event.
///
/// A session is created per request and consumed by [`run`]; it is never
/// shared across requests and holds no process-wide state. Callers that
/// stop caring about the outcome simply drop the future.
///
/// [`run`]: ResolutionSession::run
pub struct ResolutionSession<'a, F: Fetcher> {
    fetcher: &'a F,
    store: ContentStore,
    target: String,
    /// Titles already fetched or queued. Checked and set at proposal time,
    /// so a title proposed by two sibling documents is fetched once.
    visited: HashSet<String>,
    /// Discovered titles not yet handed to a fetch.
    frontier: Vec<String>,
    /// Union of eagerness per title across all of its discoverers.
    eager: HashMap<String, bool>,
    /// Titles whose settlement (success or failure) has already folded.
    settled: HashSet<String>,
    failed: Vec<String>,
    external: Vec<String>,
    bulk_failure: Option<String>,
    bulk_issued: bool,
    bulk_pending: bool,
}

impl<'a, F: Fetcher> ResolutionSession<'a, F> {
    /// Create a session for `target` with a fresh store backed by `engine`.
    pub fn new(fetcher: &'a F, engine: Arc<dyn MarkupEngine>, target: impl Into<String>) -> Self {
        Self {
            fetcher,
            store: ContentStore::new(engine),
            target: target.into(),
            visited: HashSet::new(),
            frontier: Vec::new(),
            eager: HashMap::new(),
            settled: HashSet::new(),
            failed: Vec::new(),
            external: Vec::new(),
            bulk_failure: None,
            bulk_issued: false,
            bulk_pending: false,
        }
    }

    /// Resolve the target's dependency closure and render it.
    ///
    /// The render step fires exactly once, only after the frontier is empty
    /// and no fetch remains in flight.
    pub async fn run(mut self) -> Result<SessionReport, WikifyError> {
        let target = self.target.clone();
        tracing::debug!("session start: fetching target '{target}'");

        // The target fetch strictly precedes any dependency fetch, and its
        // failure is the one per-title failure that aborts the session.
        self.visited.insert(target.clone());
        self.eager.insert(target.clone(), true);
        let document = self.fetcher.fetch_one(&target).await.map_err(|e| {
            WikifyError::TargetFetchFailed {
                title: target.clone(),
                reason: e.to_string(),
            }
        })?;
        self.store.add(document);
        self.settled.insert(target.clone());

        match self.store.parse(&target) {
            Ok(descriptor) => self.fold(descriptor, true),
            Err(e) => {
                // A target that fetched but will not parse still renders,
                // just without dependencies.
                tracing::warn!("failed to parse target '{target}': {e}");
            }
        }

        let mut in_flight = FuturesUnordered::new();
        loop {
            if self.bulk_pending {
                self.run_bulk_fetch().await?;
            }

            while in_flight.len() < MAX_CONCURRENT_FETCHES {
                let Some(title) = self.frontier.pop() else {
                    break;
                };
                tracing::debug!("expanding: fetching '{title}'");
                in_flight.push(fetch_settle(self.fetcher, title));
            }

            // The in-flight set is the outstanding-work count; when it and
            // the frontier are both drained and no bulk fetch is pending,
            // the closure is stable.
            let Some((title, result)) = in_flight.next().await else {
                break;
            };
            self.settle(title, result);
        }

        tracing::debug!(
            "closure stable ({} documents, {} failed): rendering '{target}'",
            self.store.len(),
            self.failed.len()
        );
        let output = self.store.render(&target)?;

        Ok(SessionReport {
            output,
            resolved: self.store.len(),
            failed: self.failed,
            external: self.external,
            bulk_failure: self.bulk_failure,
        })
    }

    /// Fold one settled fetch back into session state.
    fn settle(&mut self, title: String, result: Result<Document, FetchError>) {
        let expand = self.eager.get(&title).copied().unwrap_or(false);
        self.settled.insert(title.clone());

        match result {
            Ok(document) => {
                self.store.add(document);
                match self.store.parse(&title) {
                    Ok(descriptor) => self.fold(descriptor, expand),
                    Err(e) => {
                        tracing::warn!("failed to parse '{title}': {e}");
                        self.failed.push(title);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("failed to fetch '{title}': {e}");
                self.failed.push(title);
            }
        }
    }

    /// Merge a dependency descriptor into the frontier and bulk state.
    ///
    /// `expand` is the settled document's unioned eagerness: a non-eager
    /// document is itself part of the closure but its explicit dependencies
    /// are not expanded. A `RequiresAll` escalation is honored regardless of
    /// eagerness, and at most once per session.
    fn fold(&mut self, descriptor: DependencyDescriptor, expand: bool) {
        match descriptor {
            DependencyDescriptor::None => {}
            DependencyDescriptor::RequiresAll => {
                if self.bulk_issued {
                    tracing::debug!("bulk fetch already issued; ignoring repeat escalation");
                } else {
                    self.bulk_issued = true;
                    self.bulk_pending = true;
                }
            }
            DependencyDescriptor::Explicit(deps) => {
                if !expand {
                    return;
                }
                for dep in deps {
                    self.propose(dep.title, dep.eager);
                }
            }
        }
    }

    /// Propose one discovered title for fetching.
    ///
    /// Visited gating happens here, at proposal time, so duplicate discovery
    /// by sibling documents never issues a second fetch. Eagerness unions
    /// per title: a later eager proposal upgrades a title first seen
    /// non-eager, re-folding its descriptor if it already settled.
    fn propose(&mut self, title: String, eager: bool) {
        if is_external_title(&title) {
            tracing::debug!("skipping external title '{title}'");
            if !self.external.contains(&title) {
                self.external.push(title);
            }
            return;
        }

        if self.visited.insert(title.clone()) {
            self.eager.insert(title.clone(), eager);
            self.frontier.push(title);
            return;
        }

        // Already fetched or queued; only an eagerness upgrade matters.
        let known = self.eager.entry(title.clone()).or_insert(false);
        if eager && !*known {
            *known = true;
            if self.settled.contains(&title) && self.store.contains(&title) {
                tracing::debug!("eagerness upgraded for settled '{title}'; re-expanding");
                match self.store.parse(&title) {
                    Ok(descriptor) => self.fold(descriptor, true),
                    Err(e) => tracing::warn!("failed to re-parse '{title}': {e}"),
                }
            }
        }
    }

    /// Perform the one-shot corpus fetch.
    ///
    /// Returned records are a metadata index: each non-target title not
    /// already materialized is added with an empty body. A transport-level
    /// failure means the service is unreachable and fails the session; an
    /// error response or undecodable listing degrades it instead.
    async fn run_bulk_fetch(&mut self) -> Result<(), WikifyError> {
        self.bulk_pending = false;
        tracing::debug!("bulk fetching corpus listing");

        match self.fetcher.fetch_all().await {
            Ok(documents) => {
                let mut added = 0usize;
                for document in documents {
                    if document.title != self.target && self.store.add_if_absent(document) {
                        added += 1;
                    }
                }
                tracing::debug!("bulk fetch added {added} metadata documents");
                Ok(())
            }
            Err(e) if e.is_transport() => Err(WikifyError::BulkFetchFailed {
                reason: e.to_string(),
            }),
            Err(e) => {
                tracing::warn!("bulk fetch failed, continuing degraded: {e}");
                self.bulk_failure = Some(e.to_string());
                Ok(())
            }
        }
    }
}

/// Pair a fetch with its title so settlements self-identify.
fn fetch_settle<F: Fetcher>(
    fetcher: &F,
    title: String,
) -> impl Future<Output = (String, Result<Document, FetchError>)> + Send {
    async move {
        let result = fetcher.fetch_one(&title).await;
        (title, result)
    }
}

/// Titles that are absolute URLs live outside the content service and are
/// never fetched from it.
fn is_external_title(title: &str) -> bool {
    let lower = title.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve and render `target` in one call.
///
/// Convenience wrapper used by both front ends: builds a session against
/// `fetcher` with a store backed by `engine`, runs it to its single
/// completion, and returns the report.
pub async fn render_document<F: Fetcher>(
    fetcher: &F,
    engine: Arc<dyn MarkupEngine>,
    target: &str,
) -> Result<SessionReport, WikifyError> {
    ResolutionSession::new(fetcher, engine, target).run().await
}
