//! A single cookie and its `Set-Cookie` parsing/serialisation.

use crate::error::CookieError;
use std::time::{SystemTime, UNIX_EPOCH};

/// One stored cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Epoch milliseconds. `-1` means session/never-expires.
    pub expires: i64,
    pub path: String,
    pub domain: String,
    pub httponly: bool,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Lowercase an attribute key and strip everything but ascii alphanumerics,
/// so `Expires`, `expires`, `Expiry` and `expiry` are all treated the same.
fn normalise_attr_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl Cookie {
    /// Build a cookie from explicit fields, defaulting `path` to `/` and
    /// `domain` to `*`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, CookieError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CookieError::EmptyName);
        }
        Ok(Self {
            name,
            value: value.into(),
            expires: -1,
            path: "/".to_string(),
            domain: "*".to_string(),
            httponly: false,
        })
    }

    /// Parse a raw `Set-Cookie` header value (the leading `Set-Cookie:`
    /// prefix, if present, is stripped first).
    pub fn from_set_cookie_str(raw: &str) -> Result<Self, CookieError> {
        let raw = raw
            .strip_prefix("Set-Cookie:")
            .or_else(|| raw.strip_prefix("set-cookie:"))
            .unwrap_or(raw)
            .trim();

        let mut segments = raw.split(';');
        let first = segments.next().ok_or(CookieError::MissingName)?.trim();
        let (name, value) = first
            .split_once('=')
            .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
            .ok_or(CookieError::MissingName)?;

        if name.is_empty() {
            return Err(CookieError::EmptyName);
        }

        let mut cookie = Cookie {
            name,
            value,
            expires: -1,
            path: "/".to_string(),
            domain: "*".to_string(),
            httponly: false,
        };

        for attr in segments {
            let attr = attr.trim();
            if attr.is_empty() {
                continue;
            }
            let (raw_key, raw_val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr, None),
            };
            match normalise_attr_key(raw_key).as_str() {
                "expires" | "expiry" => {
                    // Only the epoch-millisecond form this crate itself
                    // writes (via `to_string(true)`) is parsed back; full
                    // RFC 1123 date parsing is outside this crate's scope
                    // (see DESIGN.md).
                    if let Some(v) = raw_val
                        && let Ok(ms) = v.parse::<i64>()
                    {
                        cookie.expires = ms;
                    }
                }
                "maxage" => {
                    if let Some(v) = raw_val
                        && let Ok(seconds) = v.parse::<i64>()
                    {
                        cookie.expires = now_ms() + seconds * 1000;
                    }
                }
                "path" => {
                    if let Some(v) = raw_val {
                        cookie.path = v.to_string();
                    }
                }
                "domain" => {
                    if let Some(v) = raw_val {
                        cookie.domain = v.trim_start_matches('.').to_string();
                    }
                }
                "httponly" => cookie.httponly = true,
                _ => {}
            }
        }

        Ok(cookie)
    }

    /// `true` when `expires >= 0` and in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires >= 0 && self.expires < now_ms()
    }

    /// Wildcard `*` matches all; otherwise the stored domain must be a
    /// suffix of `candidate`, compared reversed (so `example.com` matches
    /// `www.example.com` but not `notexample.com`).
    #[must_use]
    pub fn domain_matches(&self, candidate: &str) -> bool {
        if self.domain == "*" {
            return true;
        }
        if self.domain == candidate {
            return true;
        }
        candidate.ends_with(&format!(".{}", self.domain))
    }

    /// The candidate path must begin with the stored path; an empty stored
    /// path matches everything.
    #[must_use]
    pub fn path_matches(&self, candidate: &str) -> bool {
        self.path.is_empty() || candidate.starts_with(&self.path)
    }

    /// Render as a `Set-Cookie`-style string. When `full` is `true`,
    /// attributes are included so that `from_set_cookie_str` round-trips
    /// every field; when `false`, only `name=value` is written (the form
    /// used for the outbound `Cookie:` request header).
    #[must_use]
    pub fn to_string(&self, full: bool) -> String {
        if !full {
            return format!("{}={}", self.name, self.value);
        }
        let mut out = format!("{}={}; path={}; domain={}", self.name, self.value, self.path, self.domain);
        if self.expires >= 0 {
            out.push_str(&format!("; expires={}", self.expires));
        }
        if self.httponly {
            out.push_str("; httponly");
        }
        out
    }
}
