//! Error handling for wikify.
//!
//! Two layers cooperate here:
//! 1. [`WikifyError`] - strongly typed failure cases, so callers can match on
//!    what went wrong (target fetch vs. bulk fetch vs. render, and so on).
//! 2. [`ErrorContext`] - a wrapper carrying user-facing details and an
//!    actionable suggestion, produced at the CLI boundary by
//!    [`user_friendly_error`].
//!
//! Only session-fatal conditions become a [`WikifyError`]. Per-title
//! dependency failures are absorbed inside the resolver (logged, recorded in
//! the session report) and never reach this module; the front end sees just
//! the final success or failure of the whole session.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The session-fatal error type for wikify operations.
#[derive(Error, Debug)]
pub enum WikifyError {
    /// The target document itself could not be fetched.
    ///
    /// Unlike dependency fetches, which merely degrade the closure, a
    /// failure on the target aborts the session with no render attempted.
    #[error("failed to fetch target document '{title}': {reason}")]
    TargetFetchFailed {
        /// Title of the target document.
        title: String,
        /// Why the fetch failed (status, transport, or decode detail).
        reason: String,
    },

    /// The content service was unreachable while fetching the full corpus
    /// listing.
    #[error("content service unreachable during bulk fetch: {reason}")]
    BulkFetchFailed {
        /// Transport-level failure detail.
        reason: String,
    },

    /// A document expected to be present in the store was missing.
    ///
    /// Call ordering in the resolver guarantees a document exists before it
    /// is parsed or rendered, so this indicates a bug rather than a network
    /// condition.
    #[error("document '{title}' is not in the store")]
    DocumentNotFound {
        /// Title that was looked up.
        title: String,
    },

    /// The render step reported an error.
    ///
    /// Rendering failures belong to the markup engine, not the resolution
    /// core; this variant surfaces them defensively as a session failure.
    #[error("failed to render '{title}': {reason}")]
    RenderFailed {
        /// Title of the document being rendered.
        title: String,
        /// Engine-reported failure detail.
        reason: String,
    },

    /// The configured endpoint is not a usable HTTP(S) URL.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The endpoint string as supplied.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A socket request record did not contain the required fields.
    #[error("malformed request: {reason}")]
    MalformedRequest {
        /// What was missing or unparseable.
        reason: String,
    },

    /// I/O error from the socket listener or other OS interaction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with a message, for cases without a dedicated variant.
    #[error("{message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// A [`WikifyError`] wrapped with user-facing details and a suggestion.
///
/// The CLI converts every failure into one of these before display so the
/// terminal output carries something actionable alongside the raw error.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: WikifyError,
    /// Optional actionable suggestion, rendered in green.
    pub suggestion: Option<String>,
    /// Optional additional detail, rendered in yellow.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: WikifyError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach an actionable suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional explanatory detail.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Recognized [`WikifyError`] variants get tailored suggestions; everything
/// else falls through to a generic context so nothing is ever swallowed.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    match error.downcast::<WikifyError>() {
        Ok(err) => match &err {
            WikifyError::TargetFetchFailed { title, .. } => {
                let details =
                    format!("the document '{title}' must be fetchable for rendering to start");
                ErrorContext::new(err)
                    .with_details(details)
                    .with_suggestion(
                        "Check that the title exists on the content service and that the \
                         endpoint and auth token are correct",
                    )
            }
            WikifyError::BulkFetchFailed { .. } => ErrorContext::new(err).with_suggestion(
                "Verify the endpoint is reachable; the full corpus listing is served from the \
                 endpoint root",
            ),
            WikifyError::InvalidEndpoint { .. } => ErrorContext::new(err)
                .with_suggestion("Endpoints must be absolute http:// or https:// URLs"),
            WikifyError::MalformedRequest { .. } => ErrorContext::new(err).with_details(
                "socket requests are NUL-separated records of [title, endpoint, auth_token?]",
            ),
            _ => ErrorContext::new(err),
        },
        Err(error) => ErrorContext::new(WikifyError::Other {
            message: format!("{error:#}"),
        }),
    }
}
