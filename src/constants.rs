//! Global constants used throughout the wikify codebase.
//!
//! Timeout durations and concurrency limits shared across modules are
//! defined centrally so the magic numbers stay discoverable.

use std::time::Duration;

/// Timeout applied to every individual document fetch (30 seconds).
///
/// Expiry is treated as an ordinary per-title fetch failure; only a
/// timeout on the target document itself fails the whole session.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing a connection to the content service (10 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of document fetches in flight during expansion fan-out.
///
/// The frontier can grow well beyond this while transitive dependencies
/// are being discovered; the coordinator drains it in bounded rounds.
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Default bound on concurrent Unix socket connections.
///
/// Matches the listener limit the service has always run with.
pub const DEFAULT_MAX_CONNECTIONS: usize = 20;

/// Default path for the Unix domain socket front end.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/wikify.sock";

/// Fixed User-Agent presented to the content service.
pub const CLIENT_USER_AGENT: &str = concat!("wikify/", env!("CARGO_PKG_VERSION"));
