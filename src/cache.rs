//! In-memory TTL cache for search results.
//!
//! Entries live for the lifetime of the process and are evicted lazily: an
//! expired entry is only removed by the `get` that observes it. Table and
//! hit/miss counters sit behind one mutex so that check-expiry-then-delete is
//! atomic across concurrent searches.

use crate::models::SearchQuery;
use md5::{Digest, Md5};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default time-to-live of a cached search.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expiry: Instant,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

/// Snapshot of cache occupancy and effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
}

/// Thread-safe TTL cache keyed by query fingerprint.
#[derive(Debug)]
pub struct ResultCache<V> {
    inner: Mutex<Inner<V>>,
    default_ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, counting a hit or a miss.
    ///
    /// An entry whose expiry has been reached is removed and reported as a
    /// miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let now = Instant::now();

        let lookup = inner
            .entries
            .get(key)
            .map(|entry| (now < entry.expiry).then(|| entry.value.clone()));
        let fresh = match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                inner.entries.remove(key);
                debug!(key = %short_key(key), "Evicted expired cache entry");
                None
            }
            None => None,
        };

        match fresh {
            Some(value) => {
                inner.hits += 1;
                info!(key = %short_key(key), "Cache hit");
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key` with the default TTL.
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let expiry = Instant::now() + ttl;
        self.lock()
            .entries
            .insert(key.to_string(), CacheEntry { value, expiry });
        debug!(key = %short_key(key), ttl_secs = ttl.as_secs(), "Cached value");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
        }
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[derive(Serialize)]
struct KeyMaterial<'a> {
    category: &'a str,
    location: String,
    experience: &'a str,
}

/// Deterministic cache key for a query.
///
/// Whitespace in the location is collapsed but its case is kept, since the
/// location ends up verbatim on listings that fall back to it. The experience
/// uses its canonical id, so `ambos` and `both` share a key.
pub fn fingerprint(query: &SearchQuery) -> String {
    let material = KeyMaterial {
        category: query.category.id(),
        location: crate::utils::clean_text(&query.location),
        experience: query.experience.id(),
    };
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_string(&material).unwrap_or_default();
    format!("{:x}", Md5::digest(json.as_bytes()))
}

fn short_key(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Experience};
    use std::sync::Arc;
    use std::thread;

    fn query(category: Category, location: &str, experience: Experience) -> SearchQuery {
        SearchQuery {
            category,
            location: location.to_string(),
            experience,
        }
    }

    #[test]
    fn test_get_returns_value_before_expiry() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.set("k", vec![1, 2, 3]);
        assert_eq!(cache.get("k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_get_misses_after_expiry_and_evicts() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.set_with_ttl("k", "v".to_string(), Duration::from_millis(10));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.get("k"), None);
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_zero_ttl_is_already_expired() {
        let cache = ResultCache::new(Duration::ZERO);
        cache.set("k", 1);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_set_overwrites_previous_entry() {
        let cache = ResultCache::default();
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_hit_rate() {
        let cache: ResultCache<u8> = ResultCache::default();
        assert_eq!(cache.stats().hit_rate, 0.0);

        cache.set("a", 1);
        for _ in 0..3 {
            cache.get("a");
        }
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_concurrent_access_counts_every_lookup() {
        let cache = Arc::new(ResultCache::default());
        cache.set("shared", 7u32);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..100 {
                        cache.set(&format!("t{i}-{j}"), j);
                        assert_eq!(cache.get("shared"), Some(7));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.hits, 800);
        assert_eq!(stats.entries, 801);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let q = query(Category::Mecanica, "CDMX", Experience::Both);
        assert_eq!(fingerprint(&q), fingerprint(&q.clone()));
        assert_eq!(fingerprint(&q).len(), 32);
    }

    #[test]
    fn test_fingerprint_differs_per_field() {
        let base = fingerprint(&query(Category::Mecanica, "CDMX", Experience::Both));
        assert_ne!(base, fingerprint(&query(Category::Civil, "CDMX", Experience::Both)));
        assert_ne!(base, fingerprint(&query(Category::Mecanica, "Monterrey", Experience::Both)));
        assert_ne!(
            base,
            fingerprint(&query(Category::Mecanica, "CDMX", Experience::Internship))
        );
    }

    #[test]
    fn test_fingerprint_collapses_location_whitespace() {
        assert_eq!(
            fingerprint(&query(Category::Civil, "  Ciudad de  México ", Experience::Both)),
            fingerprint(&query(Category::Civil, "Ciudad de México", Experience::Both))
        );
    }

    #[test]
    fn test_fingerprint_keeps_location_case() {
        assert_ne!(
            fingerprint(&query(Category::Civil, "CDMX", Experience::Both)),
            fingerprint(&query(Category::Civil, "cdmx", Experience::Both))
        );
    }
}
