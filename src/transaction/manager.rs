//! One transactional buffer per region touched in a unit of work

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use crate::transaction::buffer::TransactionalCache;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Routes reads and writes of a unit of work to per-region buffers and
/// finalizes all of them together.
///
/// Buffers are keyed by region id, so two differently wrapped handles to the
/// same region share one buffer.
pub struct TransactionalCacheManager {
    id: Uuid,
    transactional_caches: HashMap<String, TransactionalCache>,
}

impl TransactionalCacheManager {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transactional_caches: HashMap::new(),
        }
    }

    /// Identifier of this unit of work, as used in log output
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn get(&mut self, cache: &Arc<dyn Cache>, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.transactional_cache(cache).get(key)
    }

    pub fn put(&mut self, cache: &Arc<dyn Cache>, key: CacheKey, value: Option<CacheValue>) {
        self.transactional_cache(cache).put(key, value);
    }

    pub fn clear(&mut self, cache: &Arc<dyn Cache>) {
        self.transactional_cache(cache).clear();
    }

    /// Number of regions this unit of work has touched
    pub fn touched_regions(&self) -> usize {
        self.transactional_caches.len()
    }

    /// Commit every buffer.
    ///
    /// All buffers are finalized even if one fails; the first failure is
    /// returned.
    pub fn commit(&mut self) -> Result<()> {
        let mut first_error = None;
        for (region, txcache) in self.transactional_caches.iter_mut() {
            if let Err(e) = txcache.commit() {
                warn!(unit_of_work = %self.id, region = %region, error = %e, "Commit failed for region");
                first_error.get_or_insert(e);
            }
        }
        debug!(
            unit_of_work = %self.id,
            regions = self.transactional_caches.len(),
            "Committed cache buffers"
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn rollback(&mut self) {
        for txcache in self.transactional_caches.values_mut() {
            txcache.rollback();
        }
        debug!(
            unit_of_work = %self.id,
            regions = self.transactional_caches.len(),
            "Rolled back cache buffers"
        );
    }

    fn transactional_cache(&mut self, cache: &Arc<dyn Cache>) -> &mut TransactionalCache {
        self.transactional_caches
            .entry(cache.id().to_string())
            .or_insert_with(|| TransactionalCache::new(cache.clone()))
    }
}

impl Default for TransactionalCacheManager {
    fn default() -> Self {
        Self::new()
    }
}
