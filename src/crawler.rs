//! The crawl control loop: admission, scheduling, and the re-entrancy
//! guards that keep a slow queue from issuing the same item twice.
//!
//! A ticking loop bounded by a concurrency cap drives one queue item at a
//! time through robots gating and the admission pipeline, tracking touched
//! origins so each one's robots.txt is fetched at most once.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;

use crate::cache::CacheCollaborator;
use crate::config::CrawlerConfig;
use crate::cookie::CookieJar;
use crate::error::{CrawlerError, QueueError};
use crate::events::{CrawlEvent, EventSender};
use crate::predicates::Predicates;
use crate::queue::{FetchQueue, QueueItem, QueueItemUpdate, Status};
use crate::robots::RobotsRegistry;
use crate::url_processor::{self, ProcessOptions, Referrer};

/// Everything the control loop and request engine share, wrapped so it can
/// be cloned cheaply into spawned tasks.
pub struct Crawler {
    pub(crate) config: CrawlerConfig,
    pub(crate) queue: Arc<dyn FetchQueue>,
    pub(crate) cookie_jar: Arc<CookieJar>,
    pub(crate) robots: RobotsRegistry,
    pub(crate) predicates: RwLock<Predicates>,
    pub(crate) events: EventSender,
    pub(crate) http: reqwest::Client,
    pub(crate) cache: Option<Arc<dyn CacheCollaborator>>,

    /// Canonical engine host, possibly adopted from the first redirect when
    /// `allow_initial_domain_change` is set.
    pub(crate) host: RwLock<String>,
    pub(crate) first_request_done: AtomicBool,

    pub(crate) open_requests: Mutex<HashMap<usize, AbortHandle>>,
    pub(crate) abort_all: AtomicBool,

    fetching_robots_txt: AtomicBool,
    fetching_queue_item: AtomicBool,
    running: AtomicBool,
    wait_holds: AtomicI64,
}

impl Crawler {
    /// # Errors
    /// Propagates [`UrlError`](crate::error::UrlError) if the configured
    /// seed URL cannot be parsed.
    pub fn new(config: CrawlerConfig, queue: Arc<dyn FetchQueue>) -> Result<Arc<Self>, CrawlerError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent().to_string())
            .danger_accept_invalid_certs(config.ignore_invalid_ssl())
            .redirect(reqwest::redirect::Policy::none());

        if config.use_proxy()
            && let Some(host) = config.proxy_hostname()
        {
            let port = config.proxy_port().unwrap_or(80);
            let mut proxy_url = format!("http://{host}:{port}");
            if let (Some(user), Some(pass)) = (config.proxy_user(), config.proxy_pass()) {
                proxy_url = format!("http://{user}:{pass}@{host}:{port}");
            }
            if let Ok(proxy) = reqwest::Proxy::all(proxy_url.as_str()) {
                builder = builder.proxy(proxy);
            }
        }

        let http = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        let seed_url = config.seed_url().to_string();
        let host = url::Url::parse(&seed_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let (events, _rx) = EventSender::new();

        Ok(Arc::new(Self {
            config,
            queue,
            cookie_jar: Arc::new(CookieJar::new()),
            robots: RobotsRegistry::new(),
            predicates: RwLock::new(Predicates::new()),
            events,
            http,
            cache: None,
            host: RwLock::new(host),
            first_request_done: AtomicBool::new(false),
            open_requests: Mutex::new(HashMap::new()),
            abort_all: AtomicBool::new(false),
            fetching_robots_txt: AtomicBool::new(false),
            fetching_queue_item: AtomicBool::new(false),
            running: AtomicBool::new(false),
            wait_holds: AtomicI64::new(0),
        }))
    }

    #[must_use]
    pub fn with_cache(mut self: Arc<Self>, cache: Arc<dyn CacheCollaborator>) -> Arc<Self> {
        Arc::get_mut(&mut self).expect("no other references yet").cache = Some(cache);
        self
    }

    #[must_use]
    pub fn events(&self) -> &EventSender {
        &self.events
    }

    #[must_use]
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    #[must_use]
    pub fn cookie_jar(&self) -> &Arc<CookieJar> {
        &self.cookie_jar
    }

    /// Register a fetch condition (evaluated before queueing). Returns the
    /// slot id `remove_fetch_condition` needs.
    pub async fn add_fetch_condition(&self, predicate: crate::predicates::Predicate) -> usize {
        self.predicates.write().await.fetch_conditions.add(predicate)
    }

    /// Register a download condition (evaluated after response headers).
    pub async fn add_download_condition(&self, predicate: crate::predicates::Predicate) -> usize {
        self.predicates.write().await.download_conditions.add(predicate)
    }

    fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            strip_www: self.config.strip_www_domain(),
            strip_querystring: self.config.strip_querystring(),
            sort_query_parameters: self.config.sort_query_parameters(),
        }
    }

    /// `domainValid`: OR-combined, short-circuiting host admission rules.
    pub(crate) async fn domain_valid(&self, host: &str) -> bool {
        if !self.config.filter_by_domain() {
            return true;
        }
        let engine_host = self.host.read().await.clone();
        if host.eq_ignore_ascii_case(&engine_host) {
            return true;
        }
        if self.config.ignore_www_domain() && CrawlerConfig::hosts_match_ignoring_www(host, &engine_host) {
            return true;
        }
        if self
            .config
            .domain_whitelist()
            .iter()
            .any(|w| CrawlerConfig::hosts_match_ignoring_www(host, w))
        {
            return true;
        }
        if self.config.scan_subdomains() {
            let host_rev: String = host.chars().rev().collect();
            let engine_rev: String = engine_host.chars().rev().collect();
            if host_rev.starts_with(&engine_rev) {
                return true;
            }
        }
        false
    }

    /// `urlIsAllowed`: consult the robots registry for the item's origin.
    pub(crate) fn url_is_allowed(&self, item: &QueueItem) -> bool {
        if !self.config.respect_robots_txt() {
            return true;
        }
        self.robots.is_allowed(&item.origin(), &item.uri_path, self.config.user_agent())
    }

    /// Combine URL processing with the fixed-order scope checks from the
    /// admission design: parse, domain validity, robots, fetch conditions,
    /// queue insertion.
    pub async fn queue_url(&self, raw: &str, referrer: &Referrer, force: bool) {
        let item = match url_processor::process_url(raw, referrer, &self.process_options()) {
            Ok(item) => item,
            Err(_) => return,
        };

        if self.config.max_depth() > 0 && item.depth > self.config.max_depth() {
            return;
        }

        if !self.domain_valid(&item.host).await {
            self.events.emit(CrawlEvent::InvalidDomain { item });
            return;
        }

        if !self.url_is_allowed(&item) {
            self.events.emit(CrawlEvent::FetchDisallowed { item });
            return;
        }

        let referrer_item = match url_processor::process_url(&referrer.url, &Referrer::seed(&referrer.url), &ProcessOptions::default())
        {
            Ok(r) => r,
            Err(_) => item.clone(),
        };

        match self.predicates.read().await.fetch_conditions.all_pass(&item, &referrer_item).await {
            Ok(true) => {}
            Ok(false) => {
                self.events.emit(CrawlEvent::FetchPrevented { item });
                return;
            }
            Err(message) => {
                self.events.emit(CrawlEvent::FetchConditionError { item, message });
                return;
            }
        }

        match self.queue.add(item.clone(), force).await {
            Ok(added) => self.events.emit(CrawlEvent::QueueAdd { item: added, referrer: referrer_item }),
            Err(QueueError::Duplicate(_)) => self.events.emit(CrawlEvent::QueueDuplicate { item }),
            Err(err) => self.events.emit(CrawlEvent::QueueError { message: err.to_string(), item }),
        }
    }

    /// Start the crawl: queue the seed URL (if the queue is empty) and
    /// spawn the control loop. Idempotent while already running.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.abort_all.store(false, Ordering::SeqCst);
        info!("crawl starting at {}", self.config.seed_url());
        self.events.emit(CrawlEvent::CrawlStart);

        if self.queue.is_empty().await {
            let seed = self.config.seed_url().to_string();
            self.queue_url(&seed, &Referrer::seed(&seed), false).await;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.config.interval());
            loop {
                ticker.tick().await;
                if !engine.running.load(Ordering::SeqCst) {
                    break;
                }
                if engine.tick().await {
                    break;
                }
            }
        });
    }

    /// `stop(abort)`: stop scheduling new requests; when `abort` is `true`,
    /// also cancel every tracked in-flight request.
    pub async fn stop(&self, abort: bool) {
        self.running.store(false, Ordering::SeqCst);
        if abort {
            self.abort_all.store(true, Ordering::SeqCst);
            let mut open = self.open_requests.lock().await;
            debug!("aborting {} in-flight request(s)", open.len());
            for (_, handle) in open.drain() {
                handle.abort();
            }
        }
    }

    /// Declare that external asynchronous discovery is keeping the crawl
    /// alive. Returns a release guard; the hold also expires automatically
    /// after `listener_ttl`.
    pub fn wait(self: &Arc<Self>) -> WaitHold {
        self.wait_holds.fetch_add(1, Ordering::SeqCst);
        let engine = Arc::clone(self);
        let ttl = self.config.listener_ttl();
        let released = Arc::new(AtomicBool::new(false));
        let released_for_timer = Arc::clone(&released);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if !released_for_timer.swap(true, Ordering::SeqCst) {
                engine.wait_holds.fetch_sub(1, Ordering::SeqCst);
            }
        });
        WaitHold { engine: self.clone(), released }
    }

    fn has_wait_holds(&self) -> bool {
        self.wait_holds.load(Ordering::SeqCst) > 0
    }

    /// One control-loop tick. Returns `true` when the crawl has completed
    /// and the loop should stop spawning further ticks.
    async fn tick(self: &Arc<Self>) -> bool {
        let open_count = self.open_requests.lock().await.len();
        if open_count >= self.config.max_concurrency()
            || self.fetching_robots_txt.load(Ordering::SeqCst)
            || self.fetching_queue_item.load(Ordering::SeqCst)
        {
            return false;
        }

        self.fetching_queue_item.store(true, Ordering::SeqCst);
        let next = self.queue.oldest_unfetched_item().await;
        self.fetching_queue_item.store(false, Ordering::SeqCst);

        let Some(item) = next else {
            if open_count == 0 && !self.has_wait_holds() {
                let total = self.queue.len().await;
                let done = self
                    .queue
                    .count_items(&crate::queue::QueueItemFilter { fetched: Some(true), ..Default::default() })
                    .await;
                if total > 0 && done == total {
                    info!("crawl complete: {done}/{total} items fetched");
                    self.events.emit(CrawlEvent::Complete);
                    self.stop(false).await;
                    return true;
                }
            }
            return false;
        };

        let origin = item.origin();
        if self.config.respect_robots_txt() && !self.robots.has_touched(&origin) {
            self.robots.mark_touched(&origin);
            self.fetching_robots_txt.store(true, Ordering::SeqCst);
            let engine = Arc::clone(self);
            let item_for_robots = item.clone();
            let item_id = item.id;
            let handle = tokio::spawn(async move {
                let result = engine
                    .robots
                    .fetch(&origin, &engine.http, engine.config.user_agent(), |host| {
                        // Domain validity for a robots.txt redirect target cannot
                        // await inside a sync closure; approximate with the
                        // cheap, non-whitelist checks and defer whitelist/
                        // subdomain checks to normal admission for the sitemap
                        // URLs themselves.
                        host.eq_ignore_ascii_case(&item_for_robots.host)
                    })
                    .await;
                match result {
                    Ok(entry) => {
                        let sitemaps = entry.sitemaps().to_vec();
                        engine.robots.register(&origin, entry);
                        let robots_referrer = Referrer { url: format!("{origin}/robots.txt"), depth: 0 };
                        for sitemap in sitemaps {
                            engine.queue_url(&sitemap, &robots_referrer, false).await;
                        }
                    }
                    Err(err) => {
                        warn!("robots.txt fetch failed for {origin}: {err}");
                        engine.events.emit(CrawlEvent::RobotsTxtError { message: err.to_string() });
                    }
                }
                engine.fetching_robots_txt.store(false, Ordering::SeqCst);

                if !engine.url_is_allowed(&item_for_robots) {
                    let _ = engine
                        .queue
                        .update(
                            item_for_robots.id,
                            QueueItemUpdate { fetched: Some(true), status: Some(Status::Disallowed), ..Default::default() },
                        )
                        .await;
                    engine.events.emit(CrawlEvent::FetchDisallowed { item: item_for_robots });
                    engine.open_requests.lock().await.remove(&item_id);
                } else {
                    crate::request_engine::fetch_item(&engine, item_for_robots).await;
                }
            });
            self.open_requests.lock().await.insert(item_id, handle.abort_handle());
            return false;
        }

        if !self.url_is_allowed(&item) {
            let _ = self
                .queue
                .update(item.id, QueueItemUpdate { fetched: Some(true), status: Some(Status::Disallowed), ..Default::default() })
                .await;
            self.events.emit(CrawlEvent::FetchDisallowed { item });
            return false;
        }

        let engine = Arc::clone(self);
        let item_id = item.id;
        let handle = tokio::spawn(async move {
            crate::request_engine::fetch_item(&engine, item).await;
        });
        self.open_requests.lock().await.insert(item_id, handle.abort_handle());
        false
    }
}

/// Guard returned by [`Crawler::wait`]. Dropping it without calling
/// [`WaitHold::release`] leaves the hold in place until its TTL expires.
pub struct WaitHold {
    engine: Arc<Crawler>,
    released: Arc<AtomicBool>,
}

impl WaitHold {
    pub fn release(self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.engine.wait_holds.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
