//! Named lifecycle events over a broadcast channel.
//!
//! A thin `CrawlEvent` enum published over `tokio::sync::broadcast` so
//! callers can subscribe to admission, fetch, and discovery transitions
//! without polling the queue.

use tokio::sync::broadcast;

use crate::queue::QueueItem;

/// Every observable transition named in the external-interfaces section.
/// Error payloads carry a formatted message rather than the original error
/// type, since events must be `Clone` to fan out over a broadcast channel
/// and most error types here are not.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    CrawlStart,
    QueueAdd { item: QueueItem, referrer: QueueItem },
    QueueDuplicate { item: QueueItem },
    QueueError { message: String, item: QueueItem },
    InvalidDomain { item: QueueItem },
    FetchDisallowed { item: QueueItem },
    FetchConditionError { item: QueueItem, message: String },
    FetchPrevented { item: QueueItem },
    FetchStart { item: QueueItem },
    FetchHeaders { item: QueueItem },
    FetchComplete { item: QueueItem, body_len: usize },
    FetchRedirect { item: QueueItem, target: Option<QueueItem> },
    NotModified { item: QueueItem },
    Fetch404 { item: QueueItem },
    Fetch410 { item: QueueItem },
    FetchError { item: QueueItem },
    FetchDataError { item: QueueItem },
    FetchTimeout { item: QueueItem },
    FetchClientError { item: QueueItem, message: String },
    GzipError { item: QueueItem, message: String },
    CharsetError { item: QueueItem, message: String },
    CookieError { item: QueueItem, message: String },
    DownloadConditionError { item: QueueItem, message: String },
    DownloadPrevented { item: QueueItem },
    RobotsTxtError { message: String },
    DiscoveryComplete { item: QueueItem, urls: Vec<String> },
    Complete,
}

/// Capacity of the broadcast channel's internal ring buffer. Subscribers
/// that fall this far behind the publisher start missing events (observed
/// as `RecvError::Lagged`), which is an acceptable trade-off for an
/// observability surface, not a correctness-bearing one.
const CHANNEL_CAPACITY: usize = 1024;

/// The crawl's event publisher. Cloning shares the same underlying channel.
#[derive(Debug, Clone)]
pub struct EventSender(broadcast::Sender<CrawlEvent>);

impl EventSender {
    #[must_use]
    pub fn new() -> (Self, broadcast::Receiver<CrawlEvent>) {
        let (tx, rx) = broadcast::channel(CHANNEL_CAPACITY);
        (Self(tx), rx)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.0.subscribe()
    }

    /// Publish an event. Errors (no subscribers left) are not a crawl
    /// failure, so they are silently dropped.
    pub fn emit(&self, event: CrawlEvent) {
        let _ = self.0.send(event);
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new().0
    }
}
