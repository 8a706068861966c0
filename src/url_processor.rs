//! Canonicalise a raw URL string into a [`QueueItem`] shape.
//!
//! Trims whitespace, optionally strips `www.` and the query string, sorts
//! query parameters, and resolves relative URLs against a referrer via
//! `Url::join`.

use url::Url;

use crate::error::UrlError;
use crate::queue::{QueueItem, StateData, Status, UNASSIGNED_ID};

/// Options that change how a raw URL is canonicalised. Mirrors the subset
/// of engine configuration the URL processor consults.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub strip_www: bool,
    pub strip_querystring: bool,
    pub sort_query_parameters: bool,
}

/// A minimal stand-in referrer for items that have no real parent — used
/// for the seed URL, whose synthetic referrer has `depth = 0` so the seed
/// itself becomes `depth = 1`.
#[derive(Debug, Clone)]
pub struct Referrer {
    pub url: String,
    pub depth: u32,
}

impl Referrer {
    #[must_use]
    pub fn seed(url: impl Into<String>) -> Self {
        Self { url: url.into(), depth: 0 }
    }

    #[must_use]
    pub fn from_item(item: &QueueItem) -> Self {
        Self { url: item.url.clone(), depth: item.depth }
    }
}

fn strip_www_prefix(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn sort_query(url: &mut Url) {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if pairs.is_empty() {
        return;
    }
    let mut sorted = pairs;
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    url.query_pairs_mut().clear().extend_pairs(sorted);
}

/// Default port for a scheme, used to decide whether the port should be
/// considered "implicit" when splitting the URL into components.
fn default_port_for(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Resolve `raw` against `referrer` (or treat it as absolute if there is no
/// referrer) and canonicalise it into a fresh, not-yet-queued [`QueueItem`].
///
/// Returns `Err(UrlError::Empty)` for empty input after trimming, and
/// `Err(UrlError::Unparseable)` when the `url` crate cannot parse the
/// (possibly join-resolved) string.
pub fn process_url(
    raw: &str,
    referrer: &Referrer,
    opts: &ProcessOptions,
) -> Result<QueueItem, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => {
            let base = Url::parse(&referrer.url)
                .map_err(|_| UrlError::Unparseable(referrer.url.clone()))?;
            base.join(trimmed)
                .map_err(|_| UrlError::Unparseable(trimmed.to_string()))?
        }
    };

    if opts.strip_querystring {
        url.set_query(None);
    } else if opts.sort_query_parameters {
        sort_query(&mut url);
    }

    let host = url
        .host_str()
        .ok_or_else(|| UrlError::Unparseable(trimmed.to_string()))?
        .to_string();
    let host = if opts.strip_www { strip_www_prefix(&host).to_string() } else { host };

    let scheme = url.scheme().to_string();
    let port = url.port().or_else(|| default_port_for(&scheme)).unwrap_or(0);
    let path = url.path().to_string();
    let uri_path = {
        let mut p = path.clone();
        if let Some(q) = url.query() {
            p.push('?');
            p.push_str(q);
        }
        p
    };

    Ok(QueueItem {
        id: UNASSIGNED_ID,
        url: url.to_string(),
        protocol: scheme,
        host,
        port,
        path,
        uri_path,
        depth: referrer.depth + 1,
        referrer: referrer.url.clone(),
        fetched: false,
        status: Status::Created,
        state_data: StateData::default(),
    })
}
