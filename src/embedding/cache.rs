use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// LRU + TTL cache for query embeddings.
///
/// Keys are sha256 digests of model + text so arbitrarily long queries do
/// not bloat the key space.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, (Vec<f32>, Instant)>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn make_key(model: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"\x00");
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let mut cache = self.cache.lock();
        if let Some((vector, stored_at)) = cache.get(key) {
            if stored_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(vector.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: &str, vector: Vec<f32>) {
        let mut cache = self.cache.lock();
        cache.put(key.to_string(), (vector, Instant::now()));
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            size: self.cache.lock().len(),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_roundtrip() {
        let cache = EmbeddingCache::new(10, 300);
        let key = EmbeddingCache::make_key("m", "hello");
        assert!(cache.get(&key).is_none());

        cache.set(&key, vec![0.1, 0.2]);
        assert_eq!(cache.get(&key), Some(vec![0.1, 0.2]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = EmbeddingCache::new(10, 0);
        let key = EmbeddingCache::make_key("m", "hello");
        cache.set(&key, vec![1.0]);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_keys_differ_by_model() {
        assert_ne!(
            EmbeddingCache::make_key("model-a", "text"),
            EmbeddingCache::make_key("model-b", "text")
        );
    }

    #[test]
    fn test_lru_eviction() {
        let cache = EmbeddingCache::new(1, 300);
        let key_a = EmbeddingCache::make_key("m", "a");
        let key_b = EmbeddingCache::make_key("m", "b");
        cache.set(&key_a, vec![1.0]);
        cache.set(&key_b, vec![2.0]);
        assert!(cache.get(&key_a).is_none());
        assert_eq!(cache.get(&key_b), Some(vec![2.0]));
    }
}
