mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use skitter_crawl::{
    CacheCollaborator, CacheObject, CrawlEvent, Crawler, CrawlerConfig, MemoryCache, MemoryQueue,
};

use common::{Response, TestServer};

#[tokio::test]
async fn matching_etag_yields_not_modified() {
    let mut routes = HashMap::new();
    routes.insert("/".to_string(), Response::html("home").with_header("ETag", "\"v1\""));
    let server = TestServer::start(routes).await;
    let seed = server.url("/");

    let cache = Arc::new(MemoryCache::new());
    cache.set_cache_data(&seed, CacheObject { etag: Some("\"v1\"".to_string()), last_modified: None, body: None });

    let config = CrawlerConfig::builder()
        .seed_url(seed)
        .interval(Duration::from_millis(10))
        .respect_robots_txt(false)
        .build()
        .unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let crawler = Crawler::new(config, queue).unwrap().with_cache(cache);
    let events = crawler.events().subscribe();

    let collected = common::run_to_completion(&crawler, events).await;

    assert!(collected.iter().any(|e| matches!(e, CrawlEvent::NotModified { .. })));
    assert!(!collected.iter().any(|e| matches!(e, CrawlEvent::FetchComplete { .. })));
}

#[tokio::test]
async fn stale_etag_still_downloads() {
    let mut routes = HashMap::new();
    routes.insert("/".to_string(), Response::html("home").with_header("ETag", "\"v2\""));
    let server = TestServer::start(routes).await;
    let seed = server.url("/");

    let cache = Arc::new(MemoryCache::new());
    cache.set_cache_data(&seed, CacheObject { etag: Some("\"v1\"".to_string()), last_modified: None, body: None });

    let config = CrawlerConfig::builder()
        .seed_url(seed)
        .interval(Duration::from_millis(10))
        .respect_robots_txt(false)
        .build()
        .unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let crawler = Crawler::new(config, queue).unwrap().with_cache(cache);
    let events = crawler.events().subscribe();

    let collected = common::run_to_completion(&crawler, events).await;

    assert!(collected.iter().any(|e| matches!(e, CrawlEvent::FetchComplete { .. })));
}
