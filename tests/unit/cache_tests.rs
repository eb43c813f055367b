/*!
 * Tests for the translation cache
 */

use doctran::translation::cache::TranslationCache;

/// Stored translations come back for the same text and language pair
#[test]
fn test_cache_withStoreAndGet_shouldReturnTranslation() {
    let cache = TranslationCache::new(true);
    cache.store("hello", "en", "fr", "bonjour");

    assert_eq!(cache.get("hello", "en", "fr"), Some("bonjour".to_string()));
    assert_eq!(cache.len(), 1);
}

/// Different language pairs are distinct entries
#[test]
fn test_cache_withDifferentLanguagePairs_shouldNotCollide() {
    let cache = TranslationCache::new(true);
    cache.store("hello", "en", "fr", "bonjour");
    cache.store("hello", "en", "de", "hallo");

    assert_eq!(cache.get("hello", "en", "fr"), Some("bonjour".to_string()));
    assert_eq!(cache.get("hello", "en", "de"), Some("hallo".to_string()));
    assert_eq!(cache.len(), 2);
}

/// A disabled cache stores and returns nothing
#[test]
fn test_cache_withDisabled_shouldNotStore() {
    let cache = TranslationCache::new(false);
    cache.store("hello", "en", "fr", "bonjour");

    assert_eq!(cache.get("hello", "en", "fr"), None);
    assert!(cache.is_empty());
}

/// Hit and miss counters feed the statistics
#[test]
fn test_cache_stats_withHitsAndMisses_shouldComputeRate() {
    let cache = TranslationCache::new(true);
    cache.store("a", "en", "fr", "x");

    let _ = cache.get("a", "en", "fr"); // hit
    let _ = cache.get("b", "en", "fr"); // miss

    let (hits, misses, rate) = cache.stats();
    assert_eq!(hits, 1);
    assert_eq!(misses, 1);
    assert!((rate - 0.5).abs() < f64::EPSILON);
}

/// Clones share underlying storage
#[test]
fn test_cache_withClone_shouldShareEntries() {
    let cache = TranslationCache::new(true);
    let clone = cache.clone();

    cache.store("shared", "en", "fr", "partagé");
    assert_eq!(clone.get("shared", "en", "fr"), Some("partagé".to_string()));

    clone.clear();
    assert!(cache.is_empty());
}
