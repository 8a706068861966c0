//! Type-safe builder for `CrawlerConfig` using the typestate pattern: the
//! only required field is `seed_url`, so there is a single state
//! transition from the unconfigured builder to one whose `build()` is
//! callable.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use regex::Regex;

use super::types::{CrawlerConfig, MimePattern, UrlEncoding};
use crate::error::CrawlerError;

pub struct WithSeedUrl;

pub struct CrawlerConfigBuilder<State = ()> {
    inner: CrawlerConfig,
    _phantom: PhantomData<State>,
}

impl Default for CrawlerConfigBuilder<()> {
    fn default() -> Self {
        Self { inner: CrawlerConfig::default(), _phantom: PhantomData }
    }
}

impl CrawlerConfig {
    #[must_use]
    pub fn builder() -> CrawlerConfigBuilder<()> {
        CrawlerConfigBuilder::default()
    }
}

impl CrawlerConfigBuilder<()> {
    #[must_use]
    pub fn seed_url(mut self, url: impl Into<String>) -> CrawlerConfigBuilder<WithSeedUrl> {
        self.inner.seed_url = url.into();
        CrawlerConfigBuilder { inner: self.inner, _phantom: PhantomData }
    }
}

impl CrawlerConfigBuilder<WithSeedUrl> {
    /// # Errors
    /// Returns [`CrawlerError::NoSeedUrl`] if `seed_url` was set but empty
    /// after trimming.
    pub fn build(self) -> Result<CrawlerConfig, CrawlerError> {
        if self.inner.seed_url.trim().is_empty() {
            return Err(CrawlerError::NoSeedUrl);
        }
        Ok(self.inner)
    }
}

/// Builder methods available regardless of typestate, since every field but
/// `seed_url` has a sensible default.
impl<State> CrawlerConfigBuilder<State> {
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.inner.interval = interval;
        self
    }

    #[must_use]
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.inner.max_concurrency = n;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner.timeout = timeout;
        self
    }

    #[must_use]
    pub fn listener_ttl(mut self, ttl: Duration) -> Self {
        self.inner.listener_ttl = ttl;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.inner.user_agent = ua.into();
        self
    }

    #[must_use]
    pub fn respect_robots_txt(mut self, v: bool) -> Self {
        self.inner.respect_robots_txt = v;
        self
    }

    #[must_use]
    pub fn allow_initial_domain_change(mut self, v: bool) -> Self {
        self.inner.allow_initial_domain_change = v;
        self
    }

    #[must_use]
    pub fn decompress_responses(mut self, v: bool) -> Self {
        self.inner.decompress_responses = v;
        self
    }

    #[must_use]
    pub fn decode_responses(mut self, v: bool) -> Self {
        self.inner.decode_responses = v;
        self
    }

    #[must_use]
    pub fn filter_by_domain(mut self, v: bool) -> Self {
        self.inner.filter_by_domain = v;
        self
    }

    #[must_use]
    pub fn scan_subdomains(mut self, v: bool) -> Self {
        self.inner.scan_subdomains = v;
        self
    }

    #[must_use]
    pub fn ignore_www_domain(mut self, v: bool) -> Self {
        self.inner.ignore_www_domain = v;
        self
    }

    #[must_use]
    pub fn strip_www_domain(mut self, v: bool) -> Self {
        self.inner.strip_www_domain = v;
        self
    }

    #[must_use]
    pub fn proxy(mut self, hostname: impl Into<String>, port: u16) -> Self {
        self.inner.use_proxy = true;
        self.inner.proxy_hostname = Some(hostname.into());
        self.inner.proxy_port = Some(port);
        self
    }

    #[must_use]
    pub fn proxy_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.inner.proxy_user = Some(user.into());
        self.inner.proxy_pass = Some(pass.into());
        self
    }

    #[must_use]
    pub fn basic_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.inner.needs_auth = true;
        self.inner.auth_user = Some(user.into());
        self.inner.auth_pass = Some(pass.into());
        self
    }

    #[must_use]
    pub fn accept_cookies(mut self, v: bool) -> Self {
        self.inner.accept_cookies = v;
        self
    }

    #[must_use]
    pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.custom_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn custom_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.inner.custom_headers = headers;
        self
    }

    #[must_use]
    pub fn domain_whitelist(mut self, hosts: Vec<String>) -> Self {
        self.inner.domain_whitelist = hosts;
        self
    }

    #[must_use]
    pub fn allowed_protocols(mut self, patterns: Vec<Regex>) -> Self {
        self.inner.allowed_protocols = patterns;
        self
    }

    #[must_use]
    pub fn max_resource_size(mut self, bytes: u64) -> Self {
        self.inner.max_resource_size = bytes;
        self
    }

    #[must_use]
    pub fn supported_mime_types(mut self, types: Vec<MimePattern>) -> Self {
        self.inner.supported_mime_types = types;
        self
    }

    #[must_use]
    pub fn download_unsupported(mut self, v: bool) -> Self {
        self.inner.download_unsupported = v;
        self
    }

    #[must_use]
    pub fn url_encoding(mut self, encoding: UrlEncoding) -> Self {
        self.inner.url_encoding = encoding;
        self
    }

    #[must_use]
    pub fn strip_querystring(mut self, v: bool) -> Self {
        self.inner.strip_querystring = v;
        self
    }

    #[must_use]
    pub fn sort_query_parameters(mut self, v: bool) -> Self {
        self.inner.sort_query_parameters = v;
        self
    }

    #[must_use]
    pub fn parse_html_comments(mut self, v: bool) -> Self {
        self.inner.parse_html_comments = v;
        self
    }

    #[must_use]
    pub fn parse_script_tags(mut self, v: bool) -> Self {
        self.inner.parse_script_tags = v;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.inner.max_depth = depth;
        self
    }

    #[must_use]
    pub fn ignore_invalid_ssl(mut self, v: bool) -> Self {
        self.inner.ignore_invalid_ssl = v;
        self
    }

    #[must_use]
    pub fn discover_regex(mut self, patterns: Vec<Regex>) -> Self {
        self.inner.discover_regex = patterns;
        self
    }
}
