/// Resolution cache - bounded, TTL-aware map from resolved key to path
use crate::path::Path;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cached resolution with its own expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: Path,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// LRU cache of resolved keys, disabled when built with capacity 0
pub struct ResolveCache {
    entries: Option<Mutex<LruCache<String, CacheEntry>>>,
}

impl ResolveCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Look up a live entry; a stale one is dropped and reported as a miss
    pub fn get(&self, key: &str) -> Option<Path> {
        let mut entries = self.entries.as_ref()?.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.path.clone()),
            Some(_) => {}
            None => return None,
        }

        debug!(key = %key, "Cache entry expired");
        entries.pop(key);
        None
    }

    /// Store `path` under `key` for `ttl`; a zero TTL stores nothing
    pub fn set(&self, key: &str, path: Path, ttl: Duration) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        if ttl.is_zero() {
            return;
        }

        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            debug!(key = %key, ttl_secs = ttl.as_secs(), "TTL out of range, not caching");
            return;
        };

        entries.lock().put(key.to_string(), CacheEntry { path, expires_at });
    }

    /// Drop `key`, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().pop(key).is_some())
            .unwrap_or(false)
    }

    /// Entries currently held, including stale ones not yet looked up
    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(cid: &str) -> Path {
        Path::parse(&format!("/dms3fs/{}", cid)).unwrap()
    }

    const CID_A: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
    const CID_B: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResolveCache::new(8);
        cache.set("k", path(CID_A), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("k"), Some(path(CID_A)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        // stale entry is removed on lookup
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_zero_ttl_is_noop() {
        let cache = ResolveCache::new(8);
        cache.set("k", path(CID_A), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_always_misses() {
        let cache = ResolveCache::new(0);
        assert!(!cache.is_enabled());

        cache.set("k", path(CID_A), Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.remove("k"));
    }

    #[test]
    fn test_oldest_entry_evicted() {
        let cache = ResolveCache::new(2);
        cache.set("a", path(CID_A), Duration::from_secs(60));
        cache.set("b", path(CID_B), Duration::from_secs(60));
        cache.set("c", path(CID_A), Duration::from_secs(60));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(path(CID_B)));
        assert_eq!(cache.get("c"), Some(path(CID_A)));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let cache = ResolveCache::new(4);
        cache.set("k", path(CID_A), Duration::from_secs(60));
        cache.set("k", path(CID_B), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(path(CID_B)));

        assert!(cache.remove("k"));
        assert_eq!(cache.get("k"), None);
    }
}
