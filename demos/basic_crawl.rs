//! Crawl a single seed URL and print every fetched page's URL and size.

use skitter_crawl::{CrawlEvent, Crawler, CrawlerConfig, MemoryQueue};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::init();

    let seed = std::env::args().nth(1).unwrap_or_else(|| "https://example.com".to_string());

    let config = CrawlerConfig::builder()
        .seed_url(seed)
        .max_concurrency(4)
        .max_depth(2)
        .build()
        .expect("valid config");

    let queue = Arc::new(MemoryQueue::new());
    let crawler = Crawler::new(config, queue).expect("valid seed url");
    let mut events = crawler.events().subscribe();

    crawler.start().await;

    loop {
        match events.recv().await {
            Ok(CrawlEvent::FetchComplete { item, body_len }) => {
                println!("{} ({body_len} bytes)", item.url);
            }
            Ok(CrawlEvent::FetchDisallowed { item }) => {
                println!("disallowed: {}", item.url);
            }
            Ok(CrawlEvent::Complete) => break,
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                eprintln!("event receiver lagged, skipped {skipped} events");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
