//! An event-driven, single-seed web crawler core.
//!
//! Given a seed URL, [`Crawler`] discovers linked resources, enforces
//! domain/protocol/MIME/depth/robots.txt scoping, fetches admitted
//! resources with bounded concurrency, and publishes every lifecycle
//! transition on a [`CrawlEvent`] broadcast channel.

pub mod cache;
pub mod config;
pub mod cookie;
pub mod error;
pub mod events;
pub mod extractor;
pub mod predicates;
pub mod queue;
pub mod request_engine;
pub mod robots;
pub mod url_processor;
pub mod crawler;

pub use cache::{CacheCollaborator, CacheObject, MemoryCache};
pub use config::{CrawlerConfig, CrawlerConfigBuilder, MimePattern, UrlEncoding};
pub use cookie::{Cookie, CookieJar};
pub use crawler::{Crawler, WaitHold};
pub use error::{CookieError, CrawlerError, PredicateError, QueueError, RequestError, RobotsError, UrlError};
pub use events::CrawlEvent;
pub use predicates::{Predicate, PredicateList, Predicates};
pub use queue::{FetchQueue, MemoryQueue, QueueItem, QueueItemFilter, QueueItemUpdate, StateData, Status};
pub use robots::{RobotsEntry, RobotsRegistry};
pub use url_processor::{ProcessOptions, Referrer};
