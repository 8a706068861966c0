//! The fetch queue: an ordered store of [`QueueItem`]s with a scan index,
//! whitelisted numeric statistics, and snapshot/restore.
//!
//! The queue API is asynchronous *by contract* — even the bundled in-memory
//! implementation goes through `async fn`, so a caller can swap in a durable
//! backend (a database-backed queue, say) without touching the control
//! loop. No method may assume its caller polls it to completion on the same
//! executor turn it was called on.

mod item;
mod memory;

pub use item::{QueueItem, StateData, Status, UNASSIGNED_ID};
pub use memory::MemoryQueue;

use crate::error::QueueError;
use async_trait::async_trait;

/// Names of the numeric `StateData` fields that [`FetchQueue::max`],
/// [`FetchQueue::min`] and [`FetchQueue::avg`] may aggregate.
pub const STATISTIC_NAMES: &[&str] = &[
    "actual_data_size",
    "content_length",
    "download_time",
    "request_latency",
    "request_time",
];

/// Partial update applied to an existing [`QueueItem`] by [`FetchQueue::update`].
///
/// Only fields set to `Some` are written — a shallow merge at the top
/// level, with `state_data` fields merged independently so a caller can
/// update `status` without clobbering previously recorded timings.
#[derive(Debug, Clone, Default)]
pub struct QueueItemUpdate {
    pub fetched: Option<bool>,
    pub status: Option<Status>,
    pub request_latency: Option<u64>,
    pub request_time: Option<u64>,
    pub download_time: Option<u64>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub code: Option<u16>,
    pub headers: Option<std::collections::HashMap<String, String>>,
    pub actual_data_size: Option<u64>,
    pub sent_incorrect_size: Option<bool>,
}

impl QueueItemUpdate {
    fn apply(self, item: &mut QueueItem) {
        if let Some(v) = self.fetched {
            item.fetched = v;
        }
        if let Some(v) = self.status {
            item.status = v;
        }
        if let Some(v) = self.request_latency {
            item.state_data.request_latency = Some(v);
        }
        if let Some(v) = self.request_time {
            item.state_data.request_time = Some(v);
        }
        if let Some(v) = self.download_time {
            item.state_data.download_time = Some(v);
        }
        if let Some(v) = self.content_length {
            item.state_data.content_length = Some(v);
        }
        if let Some(v) = self.content_type {
            item.state_data.content_type = Some(v);
        }
        if let Some(v) = self.code {
            item.state_data.code = Some(v);
        }
        if let Some(v) = self.headers {
            item.state_data.headers.extend(v);
        }
        if let Some(v) = self.actual_data_size {
            item.state_data.actual_data_size = Some(v);
        }
        if let Some(v) = self.sent_incorrect_size {
            item.state_data.sent_incorrect_size = Some(v);
        }
    }
}

/// A comparator for [`FetchQueue::count_items`]/[`FetchQueue::filter_items`]:
/// an item matches when every `Some` field here equals the same field on
/// the item.
#[derive(Debug, Clone, Default)]
pub struct QueueItemFilter {
    pub fetched: Option<bool>,
    pub status: Option<Status>,
    pub host: Option<String>,
    pub depth: Option<u32>,
}

impl QueueItemFilter {
    #[must_use]
    pub fn matches(&self, item: &QueueItem) -> bool {
        self.fetched.is_none_or(|v| v == item.fetched)
            && self.status.is_none_or(|v| v == item.status)
            && self.host.as_deref().is_none_or(|v| v == item.host)
            && self.depth.is_none_or(|v| v == item.depth)
    }
}

/// Trait implemented by any fetch queue backend.
///
/// Methods are deliberately `async` (rather than synchronous with an
/// internal lock) so a durable implementation backed by real I/O is a drop
/// in replacement for [`MemoryQueue`].
#[async_trait]
pub trait FetchQueue: Send + Sync {
    /// Insert `item`. When `force` is `false` and the URL is already
    /// present, fails with [`QueueError::Duplicate`]. When `force` is
    /// `true`, duplicates by URL are allowed, but inserting the exact same
    /// item twice (by `id`, which is unset/0 before insertion and therefore
    /// only meaningful for already-queued items) fails with
    /// [`QueueError::AlreadyQueuedTwice`].
    async fn add(&self, item: QueueItem, force: bool) -> Result<QueueItem, QueueError>;

    /// O(1) duplicate check via the scan index.
    async fn exists(&self, url: &str) -> bool;

    /// Fetch the item at `index`.
    async fn get(&self, index: usize) -> Result<QueueItem, QueueError>;

    /// Merge `update` into the item with the given `id`.
    async fn update(&self, id: usize, update: QueueItemUpdate) -> Result<QueueItem, QueueError>;

    /// The first `Queued` item at or after the oldest-unfetched cursor.
    /// Advances the cursor to that item's index. Returns `None` — not an
    /// error — when no unfetched work remains.
    async fn oldest_unfetched_item(&self) -> Option<QueueItem>;

    /// Maximum of `statistic` across fetched items, or `0` if none are
    /// fetched. Errors on an unrecognised statistic name.
    async fn max(&self, statistic: &str) -> Result<f64, QueueError>;

    /// Minimum of `statistic` across fetched items, or `0` if none are
    /// fetched.
    async fn min(&self, statistic: &str) -> Result<f64, QueueError>;

    /// Arithmetic mean of `statistic` across fetched items. `NaN` when no
    /// fetched items exist — preserved deliberately, see design notes.
    async fn avg(&self, statistic: &str) -> Result<f64, QueueError>;

    /// Count of items matching `filter`.
    async fn count_items(&self, filter: &QueueItemFilter) -> usize;

    /// All items matching `filter`, in queue order.
    async fn filter_items(&self, filter: &QueueItemFilter) -> Vec<QueueItem>;

    /// Total number of items currently in the queue.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Serialise the queue to `path`. Non-fetched items have their status
    /// rewritten to `Queued` first so in-flight work is never persisted
    /// mid-flight.
    async fn freeze(&self, path: &std::path::Path) -> Result<(), QueueError>;

    /// Replace the queue's contents with the snapshot at `path`, rebuilding
    /// the scan index and recomputing the oldest-unfetched cursor.
    async fn defrost(&self, path: &std::path::Path) -> Result<(), QueueError>;
}
