//! Whole-stack mutual exclusion

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Runs every operation on the stack below it under a single lock, making
/// compound decorator operations atomic with respect to each other.
pub struct SynchronizedCache {
    delegate: Arc<dyn Cache>,
    lock: Mutex<()>,
}

impl SynchronizedCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self {
            delegate,
            lock: Mutex::new(()),
        }
    }
}

impl Cache for SynchronizedCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        let _guard = self.lock.lock();
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        let _guard = self.lock.lock();
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        let _guard = self.lock.lock();
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.delegate.clear()
    }

    fn size(&self) -> Result<usize> {
        let _guard = self.lock.lock();
        self.delegate.size()
    }
}
