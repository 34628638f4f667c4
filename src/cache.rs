//! Read-through document cache
//!
//! Two independent key spaces are kept per cache: raw documents as returned
//! by the server, and objects hydrated from those documents by
//! [`CouchDB::map`](crate::CouchDB::map). Both are keyed by document id.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::error::{Error, Result};

/// An object stored in the object cache
pub type CachedObject = Arc<dyn Any + Send + Sync>;

/// Cache counters, for observability only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub lookups: u64,
    pub hits: u64,
    pub cached: u64,
}

/// Pluggable cache consulted before document fetches.
///
/// Lookups signal absence with [`Error::CacheMiss`]; callers fall through to
/// the network on any error.
pub trait Cache: Send + Sync {
    /// Store a raw document, overwriting any previous value.
    fn store(&self, key: &str, value: Value) -> Result<()>;

    /// Fetch a raw document.
    fn get(&self, key: &str) -> Result<Value>;

    /// Fetch a hydrated object.
    fn get_object(&self, key: &str) -> Result<CachedObject>;

    /// Remove `key` from both key spaces. Returns whether anything was removed.
    fn delete(&self, key: &str) -> bool;

    /// Record a hydrated object. The first object stored under a key wins.
    fn mapped(&self, key: &str, obj: CachedObject) -> Result<()>;

    /// Peek at a hydrated object without touching the counters.
    fn get_mapped(&self, key: &str) -> Option<CachedObject>;

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panic while holding the lock cannot leave a HashMap half-updated
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory cache. Entries live until deleted; there is no eviction.
pub struct MemoryCache {
    docs: Mutex<HashMap<String, Value>>,
    objects: Mutex<HashMap<String, CachedObject>>,
    cache_docs: bool,
    cache_objects: bool,
    lookups: AtomicU64,
    hits: AtomicU64,
    cached: AtomicU64,
}

impl MemoryCache {
    /// Create a cache, choosing which key spaces are enabled
    pub fn new(docs: bool, objects: bool) -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            cache_docs: docs,
            cache_objects: objects,
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            cached: AtomicU64::new(0),
        }
    }

    fn hit<T>(&self, found: Option<T>, key: &str) -> Result<T> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let value = found.ok_or_else(|| Error::CacheMiss(key.to_string()))?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl Cache for MemoryCache {
    fn store(&self, key: &str, value: Value) -> Result<()> {
        check_key(key)?;
        if !self.cache_docs {
            return Ok(());
        }
        lock(&self.docs).insert(key.to_string(), value);
        // counts overwrites too
        self.cached.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Value> {
        let found = lock(&self.docs).get(key).cloned();
        self.hit(found, key)
    }

    fn get_object(&self, key: &str) -> Result<CachedObject> {
        let found = lock(&self.objects).get(key).cloned();
        self.hit(found, key)
    }

    fn delete(&self, key: &str) -> bool {
        let doc = lock(&self.docs).remove(key).is_some();
        let obj = lock(&self.objects).remove(key).is_some();
        let deleted = doc || obj;
        if deleted {
            let _ = self
                .cached
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        }
        deleted
    }

    fn mapped(&self, key: &str, obj: CachedObject) -> Result<()> {
        check_key(key)?;
        if !self.cache_objects {
            return Ok(());
        }
        let mut objects = lock(&self.objects);
        if !objects.contains_key(key) {
            objects.insert(key.to_string(), obj);
            self.cached.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn get_mapped(&self, key: &str) -> Option<CachedObject> {
        lock(&self.objects).get(key).cloned()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_then_get() {
        let cache = MemoryCache::default();
        cache.store("a", json!({"x": 1})).unwrap();
        assert_eq!(cache.get("a").unwrap(), json!({"x": 1}));

        cache.store("a", json!({"x": 2})).unwrap();
        assert_eq!(cache.get("a").unwrap(), json!({"x": 2}));
    }

    #[test]
    fn test_miss() {
        let cache = MemoryCache::default();
        assert!(matches!(cache.get("nope"), Err(Error::CacheMiss(k)) if k == "nope"));
        assert!(matches!(cache.get_object("nope"), Err(Error::CacheMiss(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        let cache = MemoryCache::default();
        assert!(matches!(cache.store("", json!(1)), Err(Error::InvalidKey(_))));
        assert!(matches!(
            cache.mapped("", Arc::new(1u32)),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_counters() {
        let cache = MemoryCache::default();
        let _ = cache.get("a");
        cache.store("a", json!(1)).unwrap();
        cache.store("a", json!(2)).unwrap();
        let _ = cache.get("a");

        assert_eq!(
            cache.stats(),
            CacheStats {
                lookups: 2,
                hits: 1,
                cached: 2
            }
        );
    }

    #[test]
    fn test_delete_both_spaces() {
        let cache = MemoryCache::default();
        assert!(!cache.delete("a"));

        cache.store("a", json!(1)).unwrap();
        cache.mapped("a", Arc::new("obj".to_string())).unwrap();
        assert!(cache.delete("a"));
        assert!(cache.get("a").is_err());
        assert!(cache.get_object("a").is_err());
        assert!(!cache.delete("a"));
    }

    #[test]
    fn test_delete_object_only() {
        let cache = MemoryCache::default();
        cache.mapped("b", Arc::new(5i64)).unwrap();
        assert!(cache.delete("b"));
        assert!(cache.get_mapped("b").is_none());
    }

    #[test]
    fn test_mapped_first_write_wins() {
        let cache = MemoryCache::default();
        cache.mapped("k", Arc::new(1u32)).unwrap();
        cache.mapped("k", Arc::new(2u32)).unwrap();

        let obj = cache.get_object("k").unwrap();
        assert_eq!(obj.downcast_ref::<u32>(), Some(&1));
        assert_eq!(cache.stats().cached, 1);
    }

    #[test]
    fn test_disabled_spaces() {
        let cache = MemoryCache::new(false, false);
        cache.store("a", json!(1)).unwrap();
        cache.mapped("a", Arc::new(1u8)).unwrap();
        assert!(cache.get("a").is_err());
        assert!(cache.get_mapped("a").is_none());
        assert_eq!(cache.stats().cached, 0);
    }

    #[test]
    fn test_get_mapped_does_not_count() {
        let cache = MemoryCache::default();
        cache.mapped("a", Arc::new(1u8)).unwrap();
        assert!(cache.get_mapped("a").is_some());
        assert_eq!(cache.stats().lookups, 0);
    }
}
