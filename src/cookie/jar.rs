//! Session cookie storage, keyed by `(name, domain)`.

use std::collections::HashMap;
use std::sync::RwLock;

use super::cookie::Cookie;
use crate::error::CookieError;

/// Unordered collection of cookies keyed by `(name, domain)`; inserting
/// with an existing key overwrites the previous entry.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<HashMap<(String, String), Cookie>>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully constructed cookie.
    pub fn add(&self, cookie: Cookie) {
        let key = (cookie.name.clone(), cookie.domain.clone());
        self.cookies.write().expect("cookie jar lock poisoned").insert(key, cookie);
    }

    /// Parse and add a raw `Set-Cookie` header value.
    pub fn add_from_header(&self, raw: &str) -> Result<(), CookieError> {
        let cookie = Cookie::from_set_cookie_str(raw)?;
        self.add(cookie);
        Ok(())
    }

    /// Parse and add every value in `raw` (e.g. all `Set-Cookie` headers on
    /// one response).
    pub fn add_from_headers<I, S>(&self, raw: I) -> Result<(), CookieError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for header in raw {
            self.add_from_header(header.as_ref())?;
        }
        Ok(())
    }

    /// Cookies matching both filters; an absent filter matches everything.
    #[must_use]
    pub fn get(&self, name: Option<&str>, domain: Option<&str>) -> Vec<Cookie> {
        self.cookies
            .read()
            .expect("cookie jar lock poisoned")
            .values()
            .filter(|c| name.is_none_or(|n| n == c.name))
            .filter(|c| domain.is_none_or(|d| c.domain_matches(d)))
            .cloned()
            .collect()
    }

    /// The outbound `name=value` pairs for non-expired cookies matching
    /// `domain` and/or `path`. Callers join the result with `"; "`.
    #[must_use]
    pub fn get_as_header(&self, domain: Option<&str>, path: Option<&str>) -> Vec<String> {
        self.cookies
            .read()
            .expect("cookie jar lock poisoned")
            .values()
            .filter(|c| !c.is_expired())
            .filter(|c| domain.is_none_or(|d| c.domain_matches(d)))
            .filter(|c| path.is_none_or(|p| c.path_matches(p)))
            .map(|c| c.to_string(false))
            .collect()
    }

    /// Remove every cookie matching `name` and/or `domain`.
    ///
    /// Collects matching keys first and only then removes them, since
    /// removing while iterating the same map would invalidate the iterator.
    pub fn remove(&self, name: Option<&str>, domain: Option<&str>) {
        let mut cookies = self.cookies.write().expect("cookie jar lock poisoned");
        let to_remove: Vec<(String, String)> = cookies
            .iter()
            .filter(|(_, c)| name.is_none_or(|n| n == c.name))
            .filter(|(_, c)| domain.is_none_or(|d| c.domain_matches(d)))
            .map(|(k, _)| k.clone())
            .collect();
        for key in to_remove {
            cookies.remove(&key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.read().expect("cookie jar lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
