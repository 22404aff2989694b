//! Content-addressed cache of rendered diagrams.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};

use crate::consts::DEFAULT_CACHE_CAPACITY;

/// Parameters that determine a rendered diagram.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Diagram source as written in the document.
    pub source: &'a str,
    /// Kroki endpoint (e.g., "plantuml", "mermaid").
    pub endpoint: &'a str,
    /// Diagram-engine theme name, empty for unthemed languages.
    pub theme: &'a str,
}

impl DiagramKey<'_> {
    /// SHA-256 of `"{endpoint}:{theme}:{source}"`, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}:{}", self.endpoint, self.theme, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Bounded in-memory map from [`DiagramKey`] hash to sanitized SVG.
///
/// When full, the cache is cleared rather than evicting individual entries.
#[derive(Debug)]
pub struct DiagramCache {
    entries: Mutex<HashMap<String, String>>,
    capacity: usize,
}

impl DiagramCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// A cache that never stores anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn get(&self, key: &DiagramKey<'_>) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key.compute_hash()).cloned()
    }

    pub fn insert(&self, key: &DiagramKey<'_>, svg: &str) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "Diagram cache full, clearing");
            entries.clear();
        }
        entries.insert(key.compute_hash(), svg.to_owned());
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DiagramCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<'a>(source: &'a str, theme: &'a str) -> DiagramKey<'a> {
        DiagramKey {
            source,
            endpoint: "mermaid",
            theme,
        }
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = key("graph TD", "dark").compute_hash();
        assert_eq!(hash, key("graph TD", "dark").compute_hash());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_theme_and_source_matter() {
        let base = key("graph TD", "dark");
        assert_ne!(base.compute_hash(), key("graph TD", "default").compute_hash());
        assert_ne!(base.compute_hash(), key("graph LR", "dark").compute_hash());
        let other_endpoint = DiagramKey {
            endpoint: "plantuml",
            ..base
        };
        assert_ne!(base.compute_hash(), other_endpoint.compute_hash());
    }

    #[test]
    fn test_cache_get_insert() {
        let cache = DiagramCache::new(4);
        let k = key("a", "dark");
        assert!(cache.get(&k).is_none());
        cache.insert(&k, "<svg/>");
        assert_eq!(cache.get(&k).as_deref(), Some("<svg/>"));
    }

    #[test]
    fn test_cache_clears_when_full() {
        let cache = DiagramCache::new(2);
        cache.insert(&key("a", ""), "a");
        cache.insert(&key("b", ""), "b");
        cache.insert(&key("c", ""), "c");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("c", "")).is_some());
    }

    #[test]
    fn test_disabled_cache() {
        let cache = DiagramCache::disabled();
        cache.insert(&key("a", ""), "a");
        assert!(cache.get(&key("a", "")).is_none());
        assert!(cache.is_empty());
    }
}
