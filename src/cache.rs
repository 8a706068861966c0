//! Optional cache collaborator consulted for conditional requests.
//!
//! Defines the narrow trait the request engine calls through to fetch and
//! store `ETag`/`Last-Modified` validators, leaving the persistence backend
//! pluggable.

/// What the request engine stores per cached URL: the validators needed for
/// a conditional request, plus the previously downloaded body so a `304`
/// response can still be handed to the extractor.
#[derive(Debug, Clone, Default)]
pub struct CacheObject {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: Option<Vec<u8>>,
}

/// Pluggable cache backend. Implementations decide their own persistence
/// and eviction; the engine only needs get/set/save.
pub trait CacheCollaborator: Send + Sync {
    fn get_cache_data(&self, url: &str) -> Option<CacheObject>;
    fn set_cache_data(&self, url: &str, object: CacheObject);

    /// # Errors
    /// Returns whatever I/O error the backend's persistence step produces.
    fn save_cache(&self) -> Result<(), std::io::Error>;
}

/// An in-memory cache collaborator, useful for tests and for crawls that
/// only need conditional-request support within a single process lifetime.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: std::sync::RwLock<std::collections::HashMap<String, CacheObject>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheCollaborator for MemoryCache {
    fn get_cache_data(&self, url: &str) -> Option<CacheObject> {
        self.entries.read().expect("cache lock poisoned").get(url).cloned()
    }

    fn set_cache_data(&self, url: &str, object: CacheObject) {
        self.entries.write().expect("cache lock poisoned").insert(url.to_string(), object);
    }

    fn save_cache(&self) -> Result<(), std::io::Error> {
        Ok(())
    }
}
