//! Innermost cache: a plain keyed map with no ordering or eviction

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Base store of a region.
///
/// Holds entries in a hash map keyed by [`CacheKey`]. A `None` value is an
/// explicit null marker: it reads back as absent but still counts as an
/// entry.
pub struct BaseStore {
    id: String,
    entries: RwLock<HashMap<CacheKey, Option<CacheValue>>>,
}

impl BaseStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Whether an entry (including a null marker) exists for the key
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl Cache for BaseStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        self.entries.write().insert(key, value);
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        Ok(self.entries.read().get(key).cloned().flatten())
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        Ok(self.entries.write().remove(key).flatten())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        debug!(region = %self.id, "Cleared {} entries from base store", count);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
}
