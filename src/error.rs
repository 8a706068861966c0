//! Error types for the crawler core.
//!
//! Each concern gets its own `thiserror`-derived enum rather than a single
//! catch-all, matching the taxonomy in the error handling design: admission
//! and transport failures are surfaced as events and never returned here,
//! while queue, robots, cookie, predicate and configuration failures are
//! genuine `Result::Err`s.

use thiserror::Error;

/// Errors returned by `FetchQueue` operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// `add` was called without `force` and the URL is already queued.
    #[error("duplicate url: {0}")]
    Duplicate(String),

    /// `add` was called with `force=true` but the exact same item is
    /// already present in the queue.
    #[error("cannot add the same item twice")]
    AlreadyQueuedTwice,

    /// `get`/`update` referenced an id or index outside the queue.
    #[error("index {0} out of range")]
    OutOfRange(usize),

    /// `update` referenced an id that does not exist.
    #[error("no queue item with id {0}")]
    UnknownId(usize),

    /// `max`/`min`/`avg` was called with a name not in the statistics whitelist.
    #[error("invalid statistic: {0}")]
    InvalidStatistic(String),

    /// Freeze/defrost I/O or (de)serialization failure.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Errors from URL processing.
#[derive(Debug, Error)]
pub enum UrlError {
    /// Input was empty after trimming.
    #[error("empty url")]
    Empty,

    /// The `url` crate could not parse the (possibly resolved) string.
    #[error("could not parse url: {0}")]
    Unparseable(String),
}

/// Errors from robots.txt handling.
#[derive(Debug, Error)]
pub enum RobotsError {
    /// Fetching `robots.txt` failed at the transport level.
    #[error("failed to fetch robots.txt for {origin}: {source}")]
    Fetch {
        origin: String,
        #[source]
        source: reqwest::Error,
    },

    /// The robots.txt redirected to a host that admission rules disallow.
    #[error("robots.txt for {0} redirected to a disallowed domain")]
    RedirectedToDisallowedDomain(String),
}

/// Errors surfaced from predicate evaluation.
#[derive(Debug, Error)]
pub enum PredicateError {
    /// A synchronous predicate panicked-equivalent (returned an error).
    #[error("fetch condition failed: {0}")]
    FetchCondition(String),

    /// A download condition raised an error.
    #[error("download condition failed: {0}")]
    DownloadCondition(String),

    /// `remove` was called with an id that has no live slot.
    #[error("no predicate registered with id {0}")]
    UnknownId(usize),
}

/// Errors from cookie parsing.
#[derive(Debug, Error)]
pub enum CookieError {
    /// A `Set-Cookie` string had no `name=value` segment.
    #[error("cookie string has no name")]
    MissingName,

    /// The cookie name was present but empty.
    #[error("cookie name must be non-empty")]
    EmptyName,
}

/// Errors from transport-level request handling.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The underlying HTTP client reported a transport error (DNS, TCP, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No response headers arrived before the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The request was cancelled via `stop(true)`.
    #[error("request aborted")]
    Aborted,
}

/// Errors raised at configuration/call-site boundaries — these indicate
/// caller bugs rather than runtime conditions, so callers see a `Result`
/// rather than an event.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("no seed url configured")]
    NoSeedUrl,

    #[error(transparent)]
    Url(#[from] UrlError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    Robots(#[from] RobotsError),
}
