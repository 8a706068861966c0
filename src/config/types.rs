//! Core configuration type for the crawl engine.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

/// Character encoding applied to a response body before it reaches the
/// extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlEncoding {
    Unicode,
    Iso8859,
}

/// One entry of `supportedMimeTypes`: either an exact content-type string
/// or a regex, matched against the response's `Content-Type` header (before
/// any `;charset=...` suffix).
#[derive(Debug, Clone)]
pub enum MimePattern {
    Exact(String),
    Regex(Regex),
}

impl MimePattern {
    #[must_use]
    pub fn matches(&self, content_type: &str) -> bool {
        let base = content_type.split(';').next().unwrap_or(content_type).trim();
        match self {
            MimePattern::Exact(s) => s.eq_ignore_ascii_case(base),
            MimePattern::Regex(re) => re.is_match(base),
        }
    }
}

/// Engine configuration.
///
/// **INVARIANT:** `seed_url` is always present once a `CrawlerConfig` is
/// built; [`crate::config::builder::CrawlerConfigBuilder`] cannot reach
/// `build()` without it.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub(crate) seed_url: String,
    pub(crate) interval: Duration,
    pub(crate) max_concurrency: usize,
    pub(crate) timeout: Duration,
    pub(crate) listener_ttl: Duration,
    pub(crate) user_agent: String,
    pub(crate) respect_robots_txt: bool,
    pub(crate) allow_initial_domain_change: bool,
    pub(crate) decompress_responses: bool,
    pub(crate) decode_responses: bool,
    pub(crate) filter_by_domain: bool,
    pub(crate) scan_subdomains: bool,
    pub(crate) ignore_www_domain: bool,
    pub(crate) strip_www_domain: bool,
    pub(crate) use_proxy: bool,
    pub(crate) proxy_hostname: Option<String>,
    pub(crate) proxy_port: Option<u16>,
    pub(crate) proxy_user: Option<String>,
    pub(crate) proxy_pass: Option<String>,
    pub(crate) needs_auth: bool,
    pub(crate) auth_user: Option<String>,
    pub(crate) auth_pass: Option<String>,
    pub(crate) accept_cookies: bool,
    pub(crate) custom_headers: HashMap<String, String>,
    pub(crate) domain_whitelist: Vec<String>,
    pub(crate) allowed_protocols: Vec<Regex>,
    pub(crate) max_resource_size: u64,
    pub(crate) supported_mime_types: Vec<MimePattern>,
    pub(crate) download_unsupported: bool,
    pub(crate) url_encoding: UrlEncoding,
    pub(crate) strip_querystring: bool,
    pub(crate) sort_query_parameters: bool,
    pub(crate) parse_html_comments: bool,
    pub(crate) parse_script_tags: bool,
    pub(crate) max_depth: u32,
    pub(crate) ignore_invalid_ssl: bool,
    pub(crate) discover_regex: Vec<Regex>,
}

/// Default `supportedMimeTypes`: `text/*`, the RSS/Atom/XHTML application
/// types, `application/javascript`, and `xml/*`.
fn default_supported_mime_types() -> Vec<MimePattern> {
    vec![
        MimePattern::Regex(Regex::new(r"^text/").expect("valid regex")),
        MimePattern::Regex(Regex::new(r"^application/(rss|html|xhtml)\+xml$").expect("valid regex")),
        MimePattern::Exact("application/javascript".to_string()),
        MimePattern::Regex(Regex::new(r"^xml/").expect("valid regex")),
    ]
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            interval: Duration::from_millis(250),
            max_concurrency: 5,
            timeout: Duration::from_millis(300_000),
            listener_ttl: Duration::from_millis(10_000),
            user_agent: format!("skitter-crawl/{}", env!("CARGO_PKG_VERSION")),
            respect_robots_txt: true,
            allow_initial_domain_change: false,
            decompress_responses: true,
            decode_responses: false,
            filter_by_domain: true,
            scan_subdomains: false,
            ignore_www_domain: true,
            strip_www_domain: false,
            use_proxy: false,
            proxy_hostname: None,
            proxy_port: None,
            proxy_user: None,
            proxy_pass: None,
            needs_auth: false,
            auth_user: None,
            auth_pass: None,
            accept_cookies: true,
            custom_headers: HashMap::new(),
            domain_whitelist: Vec::new(),
            allowed_protocols: crate::extractor::default_allowed_protocols(),
            max_resource_size: 16 * 1024 * 1024,
            supported_mime_types: default_supported_mime_types(),
            download_unsupported: true,
            url_encoding: UrlEncoding::Unicode,
            strip_querystring: false,
            sort_query_parameters: false,
            parse_html_comments: true,
            parse_script_tags: true,
            max_depth: 0,
            ignore_invalid_ssl: false,
            discover_regex: Vec::new(),
        }
    }
}
