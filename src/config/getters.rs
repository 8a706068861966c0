//! Accessor methods for `CrawlerConfig`.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

use super::types::{CrawlerConfig, MimePattern, UrlEncoding};

impl CrawlerConfig {
    #[must_use]
    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn listener_ttl(&self) -> Duration {
        self.listener_ttl
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn respect_robots_txt(&self) -> bool {
        self.respect_robots_txt
    }

    #[must_use]
    pub fn allow_initial_domain_change(&self) -> bool {
        self.allow_initial_domain_change
    }

    #[must_use]
    pub fn decompress_responses(&self) -> bool {
        self.decompress_responses
    }

    #[must_use]
    pub fn decode_responses(&self) -> bool {
        self.decode_responses
    }

    #[must_use]
    pub fn filter_by_domain(&self) -> bool {
        self.filter_by_domain
    }

    #[must_use]
    pub fn scan_subdomains(&self) -> bool {
        self.scan_subdomains
    }

    #[must_use]
    pub fn ignore_www_domain(&self) -> bool {
        self.ignore_www_domain
    }

    #[must_use]
    pub fn strip_www_domain(&self) -> bool {
        self.strip_www_domain
    }

    #[must_use]
    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }

    #[must_use]
    pub fn proxy_hostname(&self) -> Option<&str> {
        self.proxy_hostname.as_deref()
    }

    #[must_use]
    pub fn proxy_port(&self) -> Option<u16> {
        self.proxy_port
    }

    #[must_use]
    pub fn proxy_user(&self) -> Option<&str> {
        self.proxy_user.as_deref()
    }

    #[must_use]
    pub fn proxy_pass(&self) -> Option<&str> {
        self.proxy_pass.as_deref()
    }

    #[must_use]
    pub fn needs_auth(&self) -> bool {
        self.needs_auth
    }

    #[must_use]
    pub fn auth_user(&self) -> Option<&str> {
        self.auth_user.as_deref()
    }

    #[must_use]
    pub fn auth_pass(&self) -> Option<&str> {
        self.auth_pass.as_deref()
    }

    #[must_use]
    pub fn accept_cookies(&self) -> bool {
        self.accept_cookies
    }

    #[must_use]
    pub fn custom_headers(&self) -> &HashMap<String, String> {
        &self.custom_headers
    }

    #[must_use]
    pub fn domain_whitelist(&self) -> &[String] {
        &self.domain_whitelist
    }

    #[must_use]
    pub fn allowed_protocols(&self) -> &[Regex] {
        &self.allowed_protocols
    }

    #[must_use]
    pub fn max_resource_size(&self) -> u64 {
        self.max_resource_size
    }

    #[must_use]
    pub fn supported_mime_types(&self) -> &[MimePattern] {
        &self.supported_mime_types
    }

    #[must_use]
    pub fn download_unsupported(&self) -> bool {
        self.download_unsupported
    }

    #[must_use]
    pub fn url_encoding(&self) -> UrlEncoding {
        self.url_encoding
    }

    #[must_use]
    pub fn strip_querystring(&self) -> bool {
        self.strip_querystring
    }

    #[must_use]
    pub fn sort_query_parameters(&self) -> bool {
        self.sort_query_parameters
    }

    #[must_use]
    pub fn parse_html_comments(&self) -> bool {
        self.parse_html_comments
    }

    #[must_use]
    pub fn parse_script_tags(&self) -> bool {
        self.parse_script_tags
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[must_use]
    pub fn ignore_invalid_ssl(&self) -> bool {
        self.ignore_invalid_ssl
    }

    #[must_use]
    pub fn discover_regex(&self) -> &[Regex] {
        &self.discover_regex
    }

    /// `true` when `host` (without a `www.` prefix) matches `self.host`
    /// (without a `www.` prefix).
    #[must_use]
    pub fn hosts_match_ignoring_www(a: &str, b: &str) -> bool {
        fn strip(h: &str) -> &str {
            h.strip_prefix("www.").unwrap_or(h)
        }
        strip(a).eq_ignore_ascii_case(strip(b))
    }
}
