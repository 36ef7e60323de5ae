//! First-in, first-out eviction

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Default number of keys retained before the oldest is evicted
pub const DEFAULT_FIFO_SIZE: usize = 1024;

/// Evicts the earliest-inserted key once more than `size` keys were put.
///
/// A key put twice is queued twice; evicting the stale copy later removes
/// a key that is already gone, which is a no-op on the inner cache.
pub struct FifoCache {
    delegate: Arc<dyn Cache>,
    keys: Mutex<VecDeque<CacheKey>>,
    size: usize,
}

impl FifoCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self::with_size(delegate, DEFAULT_FIFO_SIZE)
    }

    pub fn with_size(delegate: Arc<dyn Cache>, size: usize) -> Self {
        Self {
            delegate,
            keys: Mutex::new(VecDeque::with_capacity(size.min(DEFAULT_FIFO_SIZE))),
            size,
        }
    }

    fn cycle_key_list(&self, key: &CacheKey) -> Option<CacheKey> {
        let mut keys = self.keys.lock();
        keys.push_back(key.clone());
        if keys.len() > self.size {
            keys.pop_front()
        } else {
            None
        }
    }
}

impl Cache for FifoCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        if let Some(oldest) = self.cycle_key_list(&key) {
            debug!(region = %self.id(), key = %oldest, "FIFO eviction");
            self.delegate.remove(&oldest)?;
        }
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()?;
        self.keys.lock().clear();
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        self.delegate.size()
    }
}
