//! A minimal in-process HTTP/1.1 server for crawl integration tests.
//!
//! Not a general-purpose test server: one connection per request, routes
//! matched by exact path, no chunked transfer encoding. Enough to drive
//! `reqwest` against canned responses without a real network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Response {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: body.into().into_bytes(),
            delay: Duration::ZERO,
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 301,
            headers: vec![("Location".to_string(), location.to_string())],
            body: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self { status, headers: Vec::new(), body, delay: Duration::ZERO }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Hold the connection open for `delay` before writing the response, so
    /// tests can observe a request while it is still in flight.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        304 => "Not Modified",
        404 => "Not Found",
        410 => "Gone",
        _ => "Status",
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start(routes: HashMap<String, Response>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let routes = Arc::new(routes);
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let requests_for_task = Arc::clone(&requests);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak_in_flight = Arc::new(AtomicUsize::new(0));
        let in_flight_for_task = Arc::clone(&in_flight);
        let peak_in_flight_for_task = Arc::clone(&peak_in_flight);

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else { break };
                let routes = Arc::clone(&routes);
                let requests = Arc::clone(&requests_for_task);
                let in_flight = Arc::clone(&in_flight_for_task);
                let peak_in_flight = Arc::clone(&peak_in_flight_for_task);
                tokio::spawn(handle_connection(socket, routes, requests, in_flight, peak_in_flight));
            }
        });

        Self { addr, requests, in_flight, peak_in_flight }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn request_count(&self, path: &str) -> usize {
        self.requests.lock().await.iter().filter(|r| r.path == path).count()
    }

    pub async fn last_headers(&self, path: &str) -> Option<HashMap<String, String>> {
        self.requests.lock().await.iter().rev().find(|r| r.path == path).map(|r| r.headers.clone())
    }

    /// Highest number of requests this server has ever held open
    /// simultaneously (between accepting a connection and writing its
    /// response), for asserting a client-side concurrency cap.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn current_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

async fn handle_connection(
    mut socket: tokio::net::TcpStream,
    routes: Arc<HashMap<String, Response>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
) {
    let mut buf = [0u8; 8192];
    let mut received = Vec::new();
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        received.extend_from_slice(&buf[..n]);
        if received.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let text = String::from_utf8_lossy(&received);
    let Some(first_line) = text.lines().next() else { return };
    let path = first_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    let headers: HashMap<String, String> = text
        .lines()
        .skip(1)
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':').map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string())))
        .collect();

    let if_none_match = headers.get("if-none-match").cloned();
    requests.lock().await.push(RecordedRequest { path: path.clone(), headers });

    let mut response = routes.get(&path).cloned().unwrap_or_else(|| Response::bytes(404, Vec::new()));

    if let (Some(sent), Some(etag)) = (if_none_match, response.header("etag").map(str::to_string))
        && sent == etag
    {
        response = Response { status: 304, headers: Vec::new(), body: Vec::new(), delay: Duration::ZERO };
    }

    let now_in_flight = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let mut out = format!(
        "HTTP/1.1 {} {}\r\nConnection: close\r\nContent-Length: {}\r\n",
        response.status,
        reason_phrase(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");

    let _ = socket.write_all(out.as_bytes()).await;
    let _ = socket.write_all(&response.body).await;
    let _ = socket.shutdown().await;
    in_flight.fetch_sub(1, Ordering::SeqCst);
}

/// Drive `crawler` to completion, collecting every event, with a bound on
/// total wait time so a stuck crawl fails the test instead of hanging it.
pub async fn run_to_completion(
    crawler: &Arc<skitter_crawl::Crawler>,
    mut events: tokio::sync::broadcast::Receiver<skitter_crawl::CrawlEvent>,
) -> Vec<skitter_crawl::CrawlEvent> {
    crawler.start().await;
    let mut collected = Vec::new();
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(10);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            panic!("crawl did not complete within the test deadline");
        }
        match tokio::time::timeout(remaining, events.recv()).await {
            Ok(Ok(event)) => {
                let is_complete = matches!(event, skitter_crawl::CrawlEvent::Complete);
                collected.push(event);
                if is_complete {
                    break;
                }
            }
            Ok(Err(_)) => break,
            Err(_) => panic!("crawl did not complete within the test deadline"),
        }
    }
    collected
}
