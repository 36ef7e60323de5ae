//! Per-unit-of-work staging in front of a shared region cache

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Write buffer for one region within one unit of work.
///
/// Writes are staged and only reach the shared cache on [`commit`](Self::commit).
/// Keys that missed are remembered so that commit can publish an explicit
/// null for them (releasing any per-key lock held below) and rollback can hand
/// their locks back.
pub struct TransactionalCache {
    delegate: Arc<dyn Cache>,
    clear_on_commit: bool,
    entries_to_add_on_commit: HashMap<CacheKey, Option<CacheValue>>,
    entries_missed_in_cache: HashSet<CacheKey>,
}

impl TransactionalCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self {
            delegate,
            clear_on_commit: false,
            entries_to_add_on_commit: HashMap::new(),
            entries_missed_in_cache: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.delegate.id()
    }

    pub fn delegate(&self) -> &Arc<dyn Cache> {
        &self.delegate
    }

    /// Read through to the shared cache.
    ///
    /// Staged writes are not visible here. While a clear is pending every
    /// read reports absent.
    pub fn get(&mut self, key: &CacheKey) -> Result<Option<CacheValue>> {
        let value = self.delegate.get(key)?;
        if value.is_none() {
            self.entries_missed_in_cache.insert(key.clone());
        }
        if self.clear_on_commit {
            Ok(None)
        } else {
            Ok(value)
        }
    }

    pub fn put(&mut self, key: CacheKey, value: Option<CacheValue>) {
        self.entries_to_add_on_commit.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.clear_on_commit = true;
        self.entries_to_add_on_commit.clear();
    }

    pub fn is_clear_pending(&self) -> bool {
        self.clear_on_commit
    }

    pub fn pending_writes(&self) -> usize {
        self.entries_to_add_on_commit.len()
    }

    pub fn pending_misses(&self) -> usize {
        self.entries_missed_in_cache.len()
    }

    /// Publish staged state to the shared cache.
    ///
    /// The buffer is reset whether or not the flush succeeds.
    pub fn commit(&mut self) -> Result<()> {
        let result = self.flush();
        self.reset();
        result
    }

    /// Discard staged state and release locks held for missed keys.
    ///
    /// Never fails; removal errors are logged and skipped.
    pub fn rollback(&mut self) {
        self.unlock_missed_entries();
        self.reset();
    }

    fn flush(&self) -> Result<()> {
        if self.clear_on_commit {
            self.delegate.clear()?;
        }
        let mut first_error = None;

        for (key, value) in &self.entries_to_add_on_commit {
            if let Err(e) = self.delegate.put(key.clone(), value.clone()) {
                warn!(region = %self.id(), key = %key, error = %e, "Failed to flush staged entry");
                first_error.get_or_insert(e);
            }
        }
        for key in &self.entries_missed_in_cache {
            if self.entries_to_add_on_commit.contains_key(key) {
                continue;
            }
            if let Err(e) = self.delegate.put(key.clone(), None) {
                warn!(region = %self.id(), key = %key, error = %e, "Failed to publish null marker");
                first_error.get_or_insert(e);
            }
        }
        debug!(
            region = %self.id(),
            writes = self.entries_to_add_on_commit.len(),
            misses = self.entries_missed_in_cache.len(),
            "Flushed transactional cache"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn unlock_missed_entries(&self) {
        for key in self.entries_missed_in_cache.iter() {
            if let Err(e) = self.delegate.remove(key) {
                warn!(
                    region = %self.id(),
                    key = %key,
                    error = %e,
                    "Unexpected error while releasing a missed entry on rollback"
                );
            }
        }
    }

    fn reset(&mut self) {
        self.clear_on_commit = false;
        self.entries_to_add_on_commit.clear();
        self.entries_missed_in_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{store::BaseStore, types::Value};
    use crate::decorators::BlockingCache;

    fn key(n: i64) -> CacheKey {
        CacheKey::from_parts([Value::Int(n)])
    }

    #[test]
    fn test_staged_put_invisible_until_commit() {
        let shared: Arc<dyn Cache> = Arc::new(BaseStore::new("tx"));
        let mut tx = TransactionalCache::new(shared.clone());

        tx.put(key(1), Some(CacheValue::object(1)));
        assert!(tx.get(&key(1)).unwrap().is_none());
        assert!(shared.get(&key(1)).unwrap().is_none());

        tx.commit().unwrap();
        assert!(shared.get(&key(1)).unwrap().is_some());
        assert_eq!(tx.pending_writes(), 0);
        assert_eq!(tx.pending_misses(), 0);
    }

    #[test]
    fn test_commit_publishes_null_for_unresolved_miss() {
        let store = Arc::new(BaseStore::new("tx"));
        let mut tx = TransactionalCache::new(store.clone());

        assert!(tx.get(&key(1)).unwrap().is_none());
        assert!(tx.get(&key(2)).unwrap().is_none());
        tx.put(key(2), Some(CacheValue::object(2)));
        tx.commit().unwrap();

        assert!(store.contains_key(&key(1)));
        assert!(store.get(&key(1)).unwrap().is_none());
        assert!(store.get(&key(2)).unwrap().is_some());
        assert_eq!(store.size().unwrap(), 2);
    }

    #[test]
    fn test_rollback_leaves_no_null_marker() {
        let store = Arc::new(BaseStore::new("tx"));
        let mut tx = TransactionalCache::new(store.clone());

        assert!(tx.get(&key(1)).unwrap().is_none());
        tx.put(key(1), Some(CacheValue::object(1)));
        tx.rollback();

        assert!(!store.contains_key(&key(1)));
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_pending_clear() {
        let shared: Arc<dyn Cache> = Arc::new(BaseStore::new("tx"));
        shared.put(key(1), Some(CacheValue::object(1))).unwrap();
        let mut tx = TransactionalCache::new(shared.clone());

        tx.put(key(2), Some(CacheValue::object(2)));
        tx.clear();
        assert!(tx.is_clear_pending());
        assert_eq!(tx.pending_writes(), 0);
        // read isolation while the clear is pending
        assert!(tx.get(&key(1)).unwrap().is_none());
        assert!(shared.get(&key(1)).unwrap().is_some());

        tx.put(key(3), Some(CacheValue::object(3)));
        tx.commit().unwrap();

        assert!(shared.get(&key(1)).unwrap().is_none());
        assert!(shared.get(&key(2)).unwrap().is_none());
        assert!(shared.get(&key(3)).unwrap().is_some());
        assert!(!tx.is_clear_pending());
    }

    #[test]
    fn test_rollback_releases_key_locks() {
        let blocking: Arc<dyn Cache> = Arc::new(
            BlockingCache::new(Arc::new(BaseStore::new("tx")))
                .with_timeout(std::time::Duration::from_millis(50)),
        );
        let mut first = TransactionalCache::new(blocking.clone());
        assert!(first.get(&key(1)).unwrap().is_none());
        first.rollback();

        let mut second = TransactionalCache::new(blocking.clone());
        assert!(second.get(&key(1)).unwrap().is_none());
        second.commit().unwrap();

        // the null marker released the lock and reads back as a miss
        let mut third = TransactionalCache::new(blocking);
        assert!(third.get(&key(1)).unwrap().is_none());
        third.rollback();
    }

    #[test]
    fn test_rollback_swallows_removal_errors() {
        let blocking: Arc<dyn Cache> = Arc::new(BlockingCache::new(Arc::new(BaseStore::new("tx"))));
        let mut tx = TransactionalCache::new(blocking.clone());
        assert!(tx.get(&key(1)).unwrap().is_none());
        // release the lock behind the buffer's back
        blocking.remove(&key(1)).unwrap();

        tx.rollback();
        assert_eq!(tx.pending_misses(), 0);
    }
}
