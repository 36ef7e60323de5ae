//! Hit-ratio tracking

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Counts requests and hits on `get` and logs the running hit ratio.
pub struct LoggingCache {
    delegate: Arc<dyn Cache>,
    requests: AtomicU64,
    hits: AtomicU64,
}

impl LoggingCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self {
            delegate,
            requests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// `hits / requests`, or 0.0 before the first request
    pub fn hit_ratio(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            0.0
        } else {
            self.hits() as f64 / requests as f64
        }
    }
}

impl Cache for LoggingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let value = self.delegate.get(key)?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        debug!(region = %self.id(), "Cache hit ratio: {:.4}", self.hit_ratio());
        Ok(value)
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> Result<usize> {
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{store::BaseStore, types::Value};

    #[test]
    fn test_hit_ratio() {
        let cache = LoggingCache::new(Arc::new(BaseStore::new("logged")));
        assert_eq!(cache.hit_ratio(), 0.0);

        let key = CacheKey::from_parts(["k"]);
        cache.put(key.clone(), Some(CacheValue::object("v"))).unwrap();

        cache.get(&key).unwrap();
        cache.get(&key).unwrap();
        cache.get(&key).unwrap();
        cache.get(&CacheKey::from_parts(["missing"])).unwrap();

        assert_eq!(cache.requests(), 4);
        assert_eq!(cache.hits(), 3);
        assert_eq!(cache.hit_ratio(), 0.75);
    }

    #[test]
    fn test_values_untouched() {
        let cache = LoggingCache::new(Arc::new(BaseStore::new("logged")));
        let key = CacheKey::from_parts([Value::Int(1)]);
        let stored = std::sync::Arc::new(Value::from("same"));
        cache
            .put(key.clone(), Some(CacheValue::Object(stored.clone())))
            .unwrap();

        let read = cache.get(&key).unwrap().unwrap().into_object().unwrap();
        assert!(Arc::ptr_eq(&read, &stored));
    }
}
