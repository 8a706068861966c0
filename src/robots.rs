//! Per-origin robots.txt fetch and decision cache.
//!
//! Rules are keyed by origin in a `DashMap<Origin, RobotsEntry>` rather than
//! kept as one ordered list; "first matching rule wins" still holds within
//! each origin's own rule blocks.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::RobotsError;

/// One `Allow`/`Disallow` directive under a specific `User-agent` block.
#[derive(Debug, Clone)]
struct Directive {
    prefix: String,
    allow: bool,
}

/// Parsed robots.txt rules for a single user-agent block.
#[derive(Debug, Clone, Default)]
struct Block {
    user_agents: Vec<String>,
    directives: Vec<Directive>,
    crawl_delay: Option<f64>,
}

/// A parsed robots.txt for one origin (scheme+host+port).
#[derive(Debug, Clone, Default)]
pub struct RobotsEntry {
    blocks: Vec<Block>,
    sitemaps: Vec<String>,
}

impl RobotsEntry {
    /// Decide whether `path` is allowed for `user_agent`.
    ///
    /// Picks the most specific applicable block (an exact user-agent match
    /// beats `*`), then within that block the longest matching prefix wins;
    /// a tie between an `Allow` and `Disallow` of equal length favours
    /// `Allow`, per the common robots.txt convention. No matching
    /// directive at all means allowed.
    #[must_use]
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        let ua_lower = user_agent.to_lowercase();

        let exact = self
            .blocks
            .iter()
            .find(|b| b.user_agents.iter().any(|a| a.to_lowercase() == ua_lower));
        let wildcard = self.blocks.iter().find(|b| b.user_agents.iter().any(|a| a == "*"));

        let Some(block) = exact.or(wildcard) else {
            return true;
        };

        let mut best: Option<(&Directive, usize)> = None;
        for directive in &block.directives {
            if directive.prefix.is_empty() || path.starts_with(&directive.prefix) {
                let len = directive.prefix.len();
                let better = match best {
                    None => true,
                    Some((best_d, best_len)) => {
                        len > best_len || (len == best_len && directive.allow && !best_d.allow)
                    }
                };
                if better {
                    best = Some((directive, len));
                }
            }
        }

        best.map_or(true, |(d, _)| d.allow)
    }

    #[must_use]
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    #[must_use]
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let ua_lower = user_agent.to_lowercase();
        self.blocks
            .iter()
            .find(|b| b.user_agents.iter().any(|a| a.to_lowercase() == ua_lower))
            .or_else(|| self.blocks.iter().find(|b| b.user_agents.iter().any(|a| a == "*")))
            .and_then(|b| b.crawl_delay)
    }
}

/// Parse robots.txt body text into a [`RobotsEntry`].
///
/// A minimal, spec-sufficient parser: groups consecutive `User-agent`
/// lines into a block, then collects that block's `Allow`/`Disallow`
/// directives until the next `User-agent` line starts a new block.
#[must_use]
pub fn parse_robots_txt(text: &str) -> RobotsEntry {
    let mut blocks: Vec<Block> = Vec::new();
    let mut sitemaps = Vec::new();
    let mut current: Option<Block> = None;
    let mut seen_directive_since_ua = false;

    for raw_line in text.lines() {
        let line = match raw_line.split_once('#') {
            Some((before, _)) => before,
            None => raw_line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else { continue };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();

        match key.as_str() {
            "user-agent" => {
                if seen_directive_since_ua || current.is_none() {
                    if let Some(b) = current.take() {
                        blocks.push(b);
                    }
                    current = Some(Block::default());
                    seen_directive_since_ua = false;
                }
                if let Some(b) = current.as_mut() {
                    b.user_agents.push(value);
                }
            }
            "disallow" => {
                seen_directive_since_ua = true;
                if !value.is_empty()
                    && let Some(b) = current.as_mut()
                {
                    b.directives.push(Directive { prefix: value, allow: false });
                }
            }
            "allow" => {
                seen_directive_since_ua = true;
                if let Some(b) = current.as_mut() {
                    b.directives.push(Directive { prefix: value, allow: true });
                }
            }
            "crawl-delay" => {
                seen_directive_since_ua = true;
                if let Some(b) = current.as_mut()
                    && let Ok(secs) = value.parse::<f64>()
                {
                    b.crawl_delay = Some(secs);
                }
            }
            "sitemap" => sitemaps.push(value),
            _ => {}
        }
    }
    if let Some(b) = current {
        blocks.push(b);
    }

    RobotsEntry { blocks, sitemaps }
}

/// Registry of robots.txt rules keyed by origin, plus the set of origins
/// whose robots.txt has already been requested (so the control loop fetches
/// it at most once per origin).
#[derive(Debug, Default)]
pub struct RobotsRegistry {
    entries: DashMap<String, Arc<RobotsEntry>>,
    touched: DashMap<String, ()>,
}

impl RobotsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if this origin's robots.txt has already been fetched (or a
    /// fetch is recorded as attempted), so the control loop should not
    /// fetch it again.
    #[must_use]
    pub fn has_touched(&self, origin: &str) -> bool {
        self.touched.contains_key(origin)
    }

    pub fn mark_touched(&self, origin: &str) {
        self.touched.insert(origin.to_string(), ());
    }

    /// Register a successfully fetched and parsed entry for `origin`.
    pub fn register(&self, origin: &str, entry: RobotsEntry) {
        self.entries.insert(origin.to_string(), Arc::new(entry));
    }

    /// Consult the cached rules for `url`'s origin. Origins with no
    /// registered entry (not yet fetched, or the fetch returned non-2xx)
    /// are treated as fully permissive.
    #[must_use]
    pub fn is_allowed(&self, origin: &str, path: &str, user_agent: &str) -> bool {
        self.entries
            .get(origin)
            .is_none_or(|entry| entry.is_allowed(path, user_agent))
    }

    #[must_use]
    pub fn sitemaps(&self, origin: &str) -> Vec<String> {
        self.entries.get(origin).map(|e| e.sitemaps().to_vec()).unwrap_or_default()
    }

    /// Fetch and parse `origin`'s robots.txt through `client`.
    ///
    /// Redirects are followed manually (not via `reqwest`'s automatic
    /// redirect policy) so each hop's host can be checked against
    /// `domain_valid` before continuing; a redirect to a disallowed domain
    /// fails with [`RobotsError::RedirectedToDisallowedDomain`] rather than
    /// being silently followed.
    pub async fn fetch(
        &self,
        origin: &str,
        client: &reqwest::Client,
        user_agent: &str,
        domain_valid: impl Fn(&str) -> bool,
    ) -> Result<RobotsEntry, RobotsError> {
        let mut url = format!("{origin}/robots.txt");
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(url.clone()) {
                // Redirect loop: treat as permissive, matching "non-2xx
                // yields no rules".
                return Ok(RobotsEntry::default());
            }

            let response = client
                .get(url.as_str())
                .header("User-Agent", user_agent)
                .send()
                .await
                .map_err(|source| RobotsError::Fetch { origin: origin.to_string(), source })?;

            let status = response.status();
            if status.is_redirection()
                && let Some(location) = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
            {
                let next = reqwest::Url::parse(&url)
                    .ok()
                    .and_then(|base| base.join(location).ok())
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| location.to_string());

                let host = reqwest::Url::parse(&next).ok().and_then(|u| u.host_str().map(str::to_string));
                if host.as_deref().is_none_or(|h| !domain_valid(h)) {
                    return Err(RobotsError::RedirectedToDisallowedDomain(origin.to_string()));
                }
                url = next;
                continue;
            }

            if !status.is_success() {
                return Ok(RobotsEntry::default());
            }

            let text = response
                .text()
                .await
                .map_err(|source| RobotsError::Fetch { origin: origin.to_string(), source })?;
            return Ok(parse_robots_txt(&text));
        }
    }
}
