//! Per-item HTTP state machine: spool, headers, branch on status code,
//! terminal.
//!
//! `reqwest` is built without its own decompression features; gzip/deflate
//! are decoded manually via `flate2` so the body can always be decompressed
//! for the extractor while still honouring the config's choice of whether
//! to deliver compressed or decompressed bytes to the caller.

use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use flate2::read::{DeflateDecoder, GzDecoder};
use log::{debug, warn};

use crate::cache::CacheObject;
use crate::crawler::Crawler;
use crate::events::CrawlEvent;
use crate::queue::{QueueItem, QueueItemUpdate, Status};
use crate::url_processor::{self, Referrer};

/// Run one item's full request lifecycle, then release its open-requests
/// slot. Reached by the control loop for both ordinary queue picks and the
/// robots-gated first request to a new origin.
pub(crate) async fn fetch_item(engine: &Arc<Crawler>, item: QueueItem) {
    let id = item.id;
    run(engine, item).await;
    engine.open_requests.lock().await.remove(&id);
}

async fn referrer_item(engine: &Crawler, referrer_url: &str) -> QueueItem {
    url_processor::process_url(referrer_url, &Referrer::seed(referrer_url), &Default::default())
        .unwrap_or_else(|_| {
            url_processor::process_url(engine.config().seed_url(), &Referrer::seed(engine.config().seed_url()), &Default::default())
                .expect("seed url already validated at config build time")
        })
}

async fn mark(engine: &Crawler, item: &QueueItem, update: QueueItemUpdate) {
    let _ = engine.queue.update(item.id, update).await;
}

async fn run(engine: &Arc<Crawler>, item: QueueItem) {
    mark(engine, &item, QueueItemUpdate { status: Some(Status::Spooled), ..Default::default() }).await;

    let mut request = engine.http.get(item.url.as_str());
    if engine.config().decompress_responses() {
        request = request.header(reqwest::header::ACCEPT_ENCODING, "gzip, deflate");
    }
    for (name, value) in engine.config().custom_headers() {
        request = request.header(name.as_str(), value.as_str());
    }
    if engine.config().accept_cookies() {
        let cookie_header = engine.cookie_jar().get_as_header(Some(&item.host), Some(&item.path)).join("; ");
        if !cookie_header.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookie_header);
        }
    }
    if engine.config().needs_auth()
        && let (Some(user), Some(pass)) = (engine.config().auth_user(), engine.config().auth_pass())
    {
        request = request.basic_auth(user, Some(pass));
    }
    if let Some(cache) = &engine.cache
        && let Some(cached) = cache.get_cache_data(&item.url)
    {
        if let Some(etag) = cached.etag {
            request = request.header(reqwest::header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = cached.last_modified {
            request = request.header(reqwest::header::IF_MODIFIED_SINCE, last_modified);
        }
    }

    let time_commenced = Instant::now();
    engine.events.emit(CrawlEvent::FetchStart { item: item.clone() });

    let sent = tokio::time::timeout(engine.config().timeout(), request.send()).await;

    let response = match sent {
        Err(_elapsed) => {
            warn!("fetch timed out: {}", item.url);
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::Timeout), ..Default::default() }).await;
            engine.events.emit(CrawlEvent::FetchTimeout { item });
            return;
        }
        Ok(Err(transport_err)) => {
            warn!("transport error fetching {}: {transport_err}", item.url);
            mark(
                engine,
                &item,
                QueueItemUpdate { fetched: Some(true), status: Some(Status::Failed), code: Some(600), ..Default::default() },
            )
            .await;
            engine
                .events
                .emit(CrawlEvent::FetchClientError { item, message: transport_err.to_string() });
            return;
        }
        Ok(Ok(response)) => response,
    };

    let request_latency = time_commenced.elapsed().as_millis() as u64;
    let status_code = response.status().as_u16();
    let content_length = response.content_length();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mut header_map = std::collections::HashMap::new();
    for (name, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            header_map.insert(name.to_string(), v.to_string());
        }
    }
    let content_encoding = response
        .headers()
        .get(reqwest::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    let location = response.headers().get(reqwest::header::LOCATION).and_then(|v| v.to_str().ok()).map(str::to_string);

    if engine.config().accept_cookies() {
        for raw in response.headers().get_all(reqwest::header::SET_COOKIE) {
            if let Ok(raw_str) = raw.to_str()
                && let Err(err) = engine.cookie_jar().add_from_header(raw_str)
            {
                debug!("discarding unparsable Set-Cookie header for {}: {err}", item.url);
                engine
                    .events
                    .emit(CrawlEvent::CookieError { item: item.clone(), message: err.to_string() });
            }
        }
    }

    mark(
        engine,
        &item,
        QueueItemUpdate {
            request_latency: Some(request_latency),
            request_time: Some(request_latency),
            content_length,
            content_type: Some(content_type.clone()),
            code: Some(status_code),
            headers: Some(header_map),
            ..Default::default()
        },
    )
    .await;
    engine.events.emit(CrawlEvent::FetchHeaders { item: item.clone() });

    if let Some(declared) = content_length
        && declared > engine.config().max_resource_size()
    {
        mark(engine, &item, QueueItemUpdate { fetched: Some(true), ..Default::default() }).await;
        engine.events.emit(CrawlEvent::FetchDataError { item });
        return;
    }

    match status_code {
        200..=299 => handle_success(engine, item, response, content_type, content_encoding, time_commenced).await,
        304 => {
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), ..Default::default() }).await;
            let cache_object = engine.cache.as_ref().and_then(|c| c.get_cache_data(&item.url));
            engine.events.emit(CrawlEvent::NotModified { item });
            drop(cache_object);
        }
        300..=399 if location.is_some() => {
            handle_redirect(engine, item, location.expect("checked above")).await;
        }
        404 => {
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::NotFound), ..Default::default() }).await;
            engine.events.emit(CrawlEvent::Fetch404 { item });
        }
        410 => {
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::NotFound), ..Default::default() }).await;
            engine.events.emit(CrawlEvent::Fetch410 { item });
        }
        _ => {
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::Failed), ..Default::default() }).await;
            engine.events.emit(CrawlEvent::FetchError { item });
        }
    }
}

async fn handle_redirect(engine: &Arc<Crawler>, item: QueueItem, location: String) {
    mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::Redirected), ..Default::default() }).await;

    let referrer = Referrer { url: item.url.clone(), depth: item.depth };
    let is_first_request = !engine.first_request_done.swap(true, std::sync::atomic::Ordering::SeqCst);

    let target = url_processor::process_url(&location, &referrer, &Default::default()).ok();
    let target_host = target.as_ref().map(|t| t.host.clone());

    engine.events.emit(CrawlEvent::FetchRedirect { item, target: target.clone() });

    if is_first_request
        && engine.config().allow_initial_domain_change()
        && let Some(host) = target_host
    {
        *engine.host.write().await = host;
    }

    if let Some(mut target) = target {
        if is_first_request && engine.config().allow_initial_domain_change() {
            target.depth = 1;
        }
        engine.queue_url(&target.url, &referrer, false).await;
    }
}

async fn handle_success(
    engine: &Arc<Crawler>,
    item: QueueItem,
    response: reqwest::Response,
    content_type: String,
    content_encoding: String,
    time_commenced: Instant,
) {
    let referrer = referrer_item(engine, &item.referrer).await;
    match engine.predicates.read().await.download_conditions.all_pass(&item, &referrer).await {
        Ok(true) => {}
        Ok(false) => {
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::DownloadPrevented), ..Default::default() })
                .await;
            engine.events.emit(CrawlEvent::DownloadPrevented { item });
            return;
        }
        Err(message) => {
            mark(engine, &item, QueueItemUpdate { fetched: Some(true), status: Some(Status::DownloadPrevented), ..Default::default() })
                .await;
            engine.events.emit(CrawlEvent::DownloadConditionError { item, message });
            return;
        }
    }

    let supported = engine.config().supported_mime_types().iter().any(|m| m.matches(&content_type));
    if !supported && !engine.config().download_unsupported() {
        mark(
            engine,
            &item,
            QueueItemUpdate { fetched: Some(true), status: Some(Status::Downloaded), actual_data_size: Some(0), ..Default::default() },
        )
        .await;
        engine.events.emit(CrawlEvent::FetchComplete { item, body_len: 0 });
        return;
    }

    mark(engine, &item, QueueItemUpdate { status: Some(Status::Headers), ..Default::default() }).await;

    let max_size = engine.config().max_resource_size() as usize;
    let mut buffer: Vec<u8> = Vec::with_capacity(
        response.content_length().map(|n| (n as usize).min(max_size)).unwrap_or(8192),
    );

    let mut stream = response;
    loop {
        match stream.chunk().await {
            Ok(Some(chunk)) => {
                if buffer.len() + chunk.len() > max_size {
                    mark(engine, &item, QueueItemUpdate { fetched: Some(true), ..Default::default() }).await;
                    engine.events.emit(CrawlEvent::FetchDataError { item });
                    return;
                }
                buffer.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(_) => {
                mark(
                    engine,
                    &item,
                    QueueItemUpdate { fetched: Some(true), status: Some(Status::Failed), code: Some(600), ..Default::default() },
                )
                .await;
                engine.events.emit(CrawlEvent::FetchClientError { item, message: "connection closed mid-body".to_string() });
                return;
            }
        }
    }

    let actual_data_size = buffer.len() as u64;
    let declared = engine.queue.get(item.id).await.ok().and_then(|i| i.state_data.content_length);
    let sent_incorrect_size = declared.is_some_and(|d| d != actual_data_size);
    let download_time = time_commenced.elapsed().as_millis() as u64;

    let decompressed = decompress(&buffer, &content_encoding);
    let (decompressed_buf, gzip_error) = match decompressed {
        Ok(decoded) => (decoded, None),
        Err(message) => (buffer.clone(), Some(message)),
    };
    if let Some(message) = &gzip_error {
        engine.events.emit(CrawlEvent::GzipError { item: item.clone(), message: message.clone() });
    }

    let delivered = if engine.config().decompress_responses() { decompressed_buf.clone() } else { buffer.clone() };

    if let Some(cache) = &engine.cache {
        cache.set_cache_data(
            &item.url,
            CacheObject {
                etag: engine.queue.get(item.id).await.ok().and_then(|i| i.state_data.headers.get("etag").cloned()),
                last_modified: engine.queue.get(item.id).await.ok().and_then(|i| i.state_data.headers.get("last-modified").cloned()),
                body: Some(delivered.clone()),
            },
        );
    }

    mark(
        engine,
        &item,
        QueueItemUpdate {
            fetched: Some(true),
            status: Some(Status::Downloaded),
            download_time: Some(download_time),
            request_time: Some(request_time_millis(time_commenced)),
            actual_data_size: Some(actual_data_size),
            sent_incorrect_size: Some(sent_incorrect_size),
            ..Default::default()
        },
    )
    .await;

    engine.events.emit(CrawlEvent::FetchComplete { item: item.clone(), body_len: delivered.len() });

    if !supported {
        return;
    }

    let body_str = if engine.config().decode_responses() {
        let encoding = detect_charset(&content_type, &decompressed_buf);
        let (decoded, _, had_errors) = encoding.decode(&decompressed_buf);
        if had_errors {
            engine.events.emit(CrawlEvent::CharsetError {
                item: item.clone(),
                message: format!("could not cleanly decode response body as {}", encoding.name()),
            });
        }
        Some(decoded.into_owned())
    } else {
        String::from_utf8(decompressed_buf).ok()
    };

    if let Some(body_str) = body_str {
        let opts = crate::extractor::ExtractOptions {
            parse_html_comments: engine.config().parse_html_comments(),
            parse_script_tags: engine.config().parse_script_tags(),
            respect_robots_txt: engine.config().respect_robots_txt(),
            allowed_protocols: engine.config().allowed_protocols().to_vec(),
        };
        let urls = crate::extractor::discover_resources(&body_str, &item, &opts);
        let referrer = Referrer::from_item(&item);
        for url in &urls {
            engine.queue_url(url, &referrer, false).await;
        }
        engine.events.emit(CrawlEvent::DiscoveryComplete { item, urls });
    }
}

/// Resolve the charset to decode a response body with: the `Content-Type`
/// header's `charset` parameter, else a `charset=` sniffed out of a `<meta
/// charset>`-style tag within the first 512 bytes, else UTF-8.
fn detect_charset(content_type: &str, body: &[u8]) -> &'static encoding_rs::Encoding {
    if let Some(label) = content_type.split(';').skip(1).find_map(|param| param.trim().strip_prefix("charset=")) {
        let label = label.trim().trim_matches('"');
        if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }

    let window = &body[..body.len().min(512)];
    if let Ok(text) = std::str::from_utf8(window)
        && let Some(idx) = text.to_ascii_lowercase().find("charset=")
    {
        let label: String = text[idx + "charset=".len()..]
            .trim_start_matches(['"', '\''])
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        if let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }

    encoding_rs::UTF_8
}

fn request_time_millis(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn decompress(buffer: &[u8], content_encoding: &str) -> Result<Vec<u8>, String> {
    match content_encoding {
        "gzip" | "x-gzip" => {
            let mut out = Vec::new();
            GzDecoder::new(buffer).read_to_end(&mut out).map_err(|e| e.to_string())?;
            Ok(out)
        }
        "deflate" => {
            let mut out = Vec::new();
            DeflateDecoder::new(buffer).read_to_end(&mut out).map_err(|e| e.to_string())?;
            Ok(out)
        }
        _ => Ok(buffer.to_vec()),
    }
}
