//! Default link extractor: regex-based discovery of candidate URLs inside a
//! downloaded HTML/CSS/text body, followed by cleanup, protocol filtering
//! and de-duplication.
//!
//! Entity decoding is deliberately limited to five hard-coded substitutions
//! rather than full HTML-entity decoding.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::queue::QueueItem;

/// Toggles that change what the default extractor discovers.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub parse_html_comments: bool,
    pub parse_script_tags: bool,
    pub respect_robots_txt: bool,
    pub allowed_protocols: Vec<Regex>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parse_html_comments: true,
            parse_script_tags: true,
            respect_robots_txt: true,
            allowed_protocols: default_allowed_protocols(),
        }
    }
}

/// Default `allowedProtocols`: http, https, and rss/atom/feed with an
/// optional `+xml` suffix.
#[must_use]
pub fn default_allowed_protocols() -> Vec<Regex> {
    vec![
        Regex::new(r"^https?$").expect("valid regex"),
        Regex::new(r"^(rss|atom|feed)(\+xml)?$").expect("valid regex"),
    ]
}

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"));
static NOFOLLOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+name=["']robots["']\s+content=["'][^"']*nofollow[^"']*["']"#)
        .expect("valid regex")
});
static HREF_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\b(?:href|src)\s*=\s*["']([^"']+)["']"#).expect("valid regex"));
static CSS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("valid regex"));
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhttps?://[^\s"'<>]+"#).expect("valid regex"));
static SRCSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bsrcset\s*=\s*["']([^"']+)["']"#).expect("valid regex"));
static META_REFRESH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+http-equiv=["']refresh["']\s+content=["'][^;]*;\s*url=([^"']+)["']"#)
        .expect("valid regex")
});
static META_REFRESH_REV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+content=["'][^;]*;\s*url=([^"']+)["']\s+http-equiv=["']refresh["']"#)
        .expect("valid regex")
});
static JS_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^javascript:[a-z0-9_.]+\(["']([^"']+)["']\)$"#).expect("valid regex"));

/// Run the default extractor over `body`, returning fully resolved,
/// protocol-filtered, de-duplicated candidate URLs. Returns an empty vector
/// (without error) when the document opts out via robots meta nofollow.
#[must_use]
pub fn discover_resources(body: &str, referrer: &QueueItem, opts: &ExtractOptions) -> Vec<String> {
    if opts.respect_robots_txt && NOFOLLOW_RE.is_match(body) {
        return Vec::new();
    }

    let mut working = body.to_string();
    if !opts.parse_script_tags {
        working = SCRIPT_RE.replace_all(&working, "").into_owned();
    }
    if !opts.parse_html_comments {
        working = COMMENT_RE.replace_all(&working, "").into_owned();
    }

    let mut raw_candidates: Vec<String> = Vec::new();

    for cap in HREF_SRC_RE.captures_iter(&working) {
        raw_candidates.push(cap[1].to_string());
    }
    for cap in CSS_URL_RE.captures_iter(&working) {
        raw_candidates.push(cap[1].to_string());
    }
    for m in BARE_URL_RE.find_iter(&working) {
        raw_candidates.push(m.as_str().to_string());
    }
    for cap in SRCSET_RE.captures_iter(&working) {
        for candidate in cap[1].split(',') {
            if let Some(first) = candidate.trim().split_whitespace().next() {
                raw_candidates.push(first.to_string());
            }
        }
    }
    for re in [&*META_REFRESH_RE, &*META_REFRESH_REV_RE] {
        for cap in re.captures_iter(&working) {
            raw_candidates.push(cap[1].trim().to_string());
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in raw_candidates {
        if let Some(resolved) = clean_expand_resource(&raw, referrer, &opts.allowed_protocols)
            && seen.insert(resolved.clone())
        {
            out.push(resolved);
        }
    }
    out
}

/// Decode the five HTML entities most commonly seen in `href`/`src` values.
fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&#x00026;", "&")
        .replace("&#x2f;", "/")
}

/// Clean, expand and resolve a single raw candidate URL string against its
/// referrer. Returns `None` when the candidate cannot be resolved or its
/// protocol is not allowed.
fn clean_expand_resource(raw: &str, referrer: &QueueItem, allowed_protocols: &[Regex]) -> Option<String> {
    let mut candidate = raw.trim().to_string();

    if let Some(cap) = JS_CALL_RE.captures(&candidate) {
        candidate = cap[1].to_string();
    }

    candidate = decode_entities(&candidate);

    if let Some(rest) = candidate.strip_prefix("//") {
        candidate = format!("{}://{}", referrer.protocol, rest);
    }

    if let Some(idx) = candidate.find('#') {
        candidate.truncate(idx);
    }
    if candidate.is_empty() {
        return None;
    }

    let referrer_url = Url::parse(&referrer.url).ok()?;
    let resolved = match Url::parse(&candidate) {
        Ok(u) => u,
        Err(_) => referrer_url.join(&candidate).ok()?,
    };

    let scheme = resolved.scheme();
    if !allowed_protocols.iter().any(|re| re.is_match(scheme)) {
        return None;
    }

    Some(resolved.to_string())
}
