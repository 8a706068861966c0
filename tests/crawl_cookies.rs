mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use skitter_crawl::{Crawler, CrawlerConfig, MemoryQueue};

use common::{Response, TestServer};

#[tokio::test]
async fn cookie_set_on_first_response_is_sent_on_second_request() {
    let mut routes = HashMap::new();
    routes.insert(
        "/".to_string(),
        Response::html(r#"<a href="/second">next</a>"#).with_header("Set-Cookie", "session=abc123; Path=/"),
    );
    routes.insert("/second".to_string(), Response::html("done"));
    let server = TestServer::start(routes).await;

    let config = CrawlerConfig::builder()
        .seed_url(server.url("/"))
        .interval(Duration::from_millis(10))
        .respect_robots_txt(false)
        .accept_cookies(true)
        .build()
        .unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let crawler = Crawler::new(config, queue).unwrap();
    let events = crawler.events().subscribe();

    common::run_to_completion(&crawler, events).await;

    let headers = server.last_headers("/second").await.expect("second request recorded");
    let cookie_header = headers.get("cookie").expect("cookie header sent");
    assert!(cookie_header.contains("session=abc123"));
}

#[tokio::test]
async fn cookies_disabled_sends_no_cookie_header() {
    let mut routes = HashMap::new();
    routes.insert(
        "/".to_string(),
        Response::html(r#"<a href="/second">next</a>"#).with_header("Set-Cookie", "session=abc123; Path=/"),
    );
    routes.insert("/second".to_string(), Response::html("done"));
    let server = TestServer::start(routes).await;

    let config = CrawlerConfig::builder()
        .seed_url(server.url("/"))
        .interval(Duration::from_millis(10))
        .respect_robots_txt(false)
        .accept_cookies(false)
        .build()
        .unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let crawler = Crawler::new(config, queue).unwrap();
    let events = crawler.events().subscribe();

    common::run_to_completion(&crawler, events).await;

    let headers = server.last_headers("/second").await.expect("second request recorded");
    assert!(!headers.contains_key("cookie"));
}
