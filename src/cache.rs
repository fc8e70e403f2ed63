use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct StoredEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Short-lived memoization of lookup results, keyed by normalized input.
///
/// Entries expire lazily: a stale entry is dropped when it is next read, there is
/// no background sweep. Failed computations are never stored.
pub struct TtlCache<V> {
    name: &'static str,
    entries: Mutex<HashMap<String, StoredEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, StoredEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retrieves a value if it exists and has not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if Instant::now() <= entry.expires_at => {
                tracing::debug!(cache = self.name, key, "Key found and still fresh");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::debug!(cache = self.name, key, "Key found but expired");
                entries.remove(key);
                None
            }
            None => {
                tracing::debug!(cache = self.name, key, "Key not found");
                None
            }
        }
    }

    /// Stores a value with a time-to-live (TTL).
    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        let entry = StoredEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries().insert(key.to_string(), entry);
    }

    /// Returns the cached value for `key`, or runs `compute` and caches a `Some` result.
    ///
    /// The lock is not held while `compute` runs, so two concurrent misses on the same
    /// key both compute; the later result wins.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<V>>,
    {
        if let Some(value) = self.get(key) {
            return Some(value);
        }

        let value = compute().await?;
        self.put(key, value.clone(), ttl);
        Some(value)
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(30 * 60);

    async fn counted(calls: &AtomicUsize, value: Option<u32>) -> Option<u32> {
        calls.fetch_add(1, Ordering::SeqCst);
        value
    }

    #[tokio::test(start_paused = true)]
    async fn test_compute_runs_once_within_ttl() {
        let cache = TtlCache::new("test");
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_compute("k", TTL, || counted(&calls, Some(7))).await;
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        let second = cache.get_or_compute("k", TTL, || counted(&calls, Some(8))).await;

        assert_eq!(first, Some(7));
        assert_eq!(second, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_compute_runs_again_after_expiry() {
        let cache = TtlCache::new("test");
        let calls = AtomicUsize::new(0);

        cache.get_or_compute("k", TTL, || counted(&calls, Some(1))).await;
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        let refreshed = cache.get_or_compute("k", TTL, || counted(&calls, Some(2))).await;

        assert_eq!(refreshed, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let cache: TtlCache<u32> = TtlCache::new("test");
        let calls = AtomicUsize::new(0);

        assert_eq!(cache.get_or_compute("k", TTL, || counted(&calls, None)).await, None);
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_compute("k", TTL, || counted(&calls, Some(3))).await, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = TtlCache::new("test");
        cache.put("k", "value".to_string(), Duration::from_secs(60));
        assert_eq!(cache.len(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = TtlCache::new("test");
        cache.put("a", 1, TTL);
        cache.put("b", 2, TTL);
        cache.put("a", 3, TTL);

        assert_eq!(cache.get("a"), Some(3));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.len(), 2);
    }
}
