//! Least-recently-used eviction

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use lru::LruCache as KeyOrder;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Default number of keys tracked before eviction starts
pub const DEFAULT_LRU_SIZE: usize = 1024;

/// Evicts the least recently touched key once the tracked set overflows.
///
/// Both reads and writes touch a key. Only `put` evicts: once the new value
/// is stored, the eldest key is popped from the order structure if it
/// overflows and removed from the inner cache. A read never evicts.
pub struct LruCache {
    delegate: Arc<dyn Cache>,
    state: Mutex<LruState>,
}

struct LruState {
    order: KeyOrder<CacheKey, ()>,
    size: usize,
}

impl LruCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self::with_size(delegate, DEFAULT_LRU_SIZE)
    }

    pub fn with_size(delegate: Arc<dyn Cache>, size: usize) -> Self {
        Self {
            delegate,
            state: Mutex::new(LruState {
                order: KeyOrder::unbounded(),
                size,
            }),
        }
    }

    /// Change the capacity; resets the recorded access order
    pub fn set_size(&self, size: usize) {
        let mut state = self.state.lock();
        state.order = KeyOrder::unbounded();
        state.size = size;
    }

    /// Touch `key` and pop the eldest key if the order overflows
    fn cycle_key_list(&self, key: CacheKey) -> Option<CacheKey> {
        let mut state = self.state.lock();
        state.order.put(key, ());
        if state.order.len() > state.size {
            state.order.pop_lru().map(|(eldest, _)| eldest)
        } else {
            None
        }
    }
}

impl Cache for LruCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        self.delegate.put(key.clone(), value)?;
        if let Some(eldest) = self.cycle_key_list(key) {
            debug!(region = %self.id(), key = %eldest, "LRU eviction");
            self.delegate.remove(&eldest)?;
        }
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        // touch
        self.state.lock().order.get(key);
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()?;
        self.state.lock().order.clear();
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        self.delegate.size()
    }
}
