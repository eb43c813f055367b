/*!
 * Translation caching functionality.
 *
 * This module provides caching mechanisms for translations to avoid
 * redundant API calls. Keys are SHA-256 digests over the chunk text and
 * language pair, so the cache never holds a second copy of large chunks.
 */

use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Digest key combining source text, source language, and target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey([u8; 32]);

impl CacheKey {
    /// Create a new cache key
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_language.as_bytes());
        hasher.update([0]);
        hasher.update(target_language.as_bytes());
        hasher.update([0]);
        hasher.update(source_text.as_bytes());
        Self(hasher.finalize().into())
    }
}

/// Translation cache for storing and retrieving translations
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let cache = self.cache.read();

        match cache.get(&key) {
            Some(translation) => {
                let mut hits = self.hits.write();
                *hits += 1;

                debug!(
                    "Cache hit ({} -> {}, {} bytes)",
                    source_language,
                    target_language,
                    source_text.len()
                );

                Some(translation.clone())
            }
            None => {
                let mut misses = self.misses.write();
                *misses += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn store(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
        translation: &str,
    ) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let mut cache = self.cache.write();
        cache.insert(key, translation.to_string());
    }

    /// Get cache statistics
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            enabled: self.enabled,
        }
    }
}
