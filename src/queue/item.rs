//! The unit of work tracked by a [`crate::queue::FetchQueue`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a [`QueueItem`].
///
/// The happy path is `Created -> Queued -> Spooled -> Headers -> Downloaded`.
/// Every other variant except `Created` and `Queued` is terminal: once an
/// item reaches one of them `fetched` is `true` and no further mutation
/// happens to it outside of freeze/defrost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Produced by the URL processor, not yet inserted into a queue.
    Created,
    /// Inserted into the queue, waiting to be picked up.
    Queued,
    /// The request has been dispatched; response not yet received.
    Spooled,
    /// Response headers arrived; body is streaming.
    Headers,
    /// Body fully received and delivered to the extractor.
    Downloaded,
    /// Redirected via a 3xx response with a `Location` header.
    Redirected,
    /// Terminal 404/410.
    NotFound,
    /// Terminal 4xx/5xx other than 404/410, or a transport-level failure.
    Failed,
    /// No response headers within the configured timeout.
    Timeout,
    /// Disallowed by robots.txt.
    Disallowed,
    /// Rejected by a download condition after headers were received.
    DownloadPrevented,
}

impl Status {
    /// Terminal statuses are those paired with `fetched = true`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Created | Status::Queued | Status::Spooled | Status::Headers)
    }
}

/// The lifecycle data bag populated as a request progresses.
///
/// All fields start absent and are filled in as the corresponding phase of
/// the request completes; see the request engine for exactly which fields
/// are set at which phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateData {
    pub request_latency: Option<u64>,
    pub request_time: Option<u64>,
    pub download_time: Option<u64>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub code: Option<u16>,
    pub headers: HashMap<String, String>,
    pub actual_data_size: Option<u64>,
    pub sent_incorrect_size: Option<bool>,
}

/// Sentinel `id` carried by a [`QueueItem`] that has not yet been inserted
/// into a queue. Used to distinguish a freshly processed URL from one that
/// is being re-submitted (e.g. `force=true` retries).
pub const UNASSIGNED_ID: usize = usize::MAX;

/// A single unit of crawl work: a canonicalised URL plus its position in
/// the discovery graph and its request lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Assigned at insertion; always equal to the item's position in the
    /// queue at insertion time, and never reused. Items produced by the
    /// URL processor but not yet inserted carry [`UNASSIGNED_ID`].
    pub id: usize,
    pub url: String,
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub uri_path: String,
    /// Seed item depth is 1; every discovered item is `referrer.depth + 1`.
    pub depth: u32,
    pub referrer: String,
    pub fetched: bool,
    pub status: Status,
    pub state_data: StateData,
}

impl QueueItem {
    /// Origin triple `(scheme, host, port)` used to key robots.txt rules.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
