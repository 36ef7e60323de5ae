//! Time-windowed full clear

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Clears the whole inner cache once the clear interval has elapsed.
///
/// Staleness is checked before `get`, `put`, `remove` and `size`. The check
/// and the timestamp reset happen under one lock, so a burst of operations
/// in the same tick triggers at most one clear.
pub struct ScheduledCache {
    delegate: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    clear_interval: Duration,
    last_clear: Mutex<DateTime<Utc>>,
}

impl ScheduledCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self::with_clock(delegate, Arc::new(SystemClock))
    }

    pub fn with_clock(delegate: Arc<dyn Cache>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            delegate,
            clock,
            clear_interval: Duration::hours(1),
            last_clear: Mutex::new(now),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.clear_interval = interval;
        self
    }

    pub fn clear_interval(&self) -> Duration {
        self.clear_interval
    }

    fn clear_when_stale(&self) -> Result<bool> {
        {
            let now = self.clock.now();
            let mut last_clear = self.last_clear.lock();
            if now - *last_clear <= self.clear_interval {
                return Ok(false);
            }
            *last_clear = now;
        }
        info!(region = %self.id(), "Clear interval elapsed, flushing region");
        self.delegate.clear()?;
        Ok(true)
    }
}

impl Cache for ScheduledCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        self.clear_when_stale()?;
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        if self.clear_when_stale()? {
            return Ok(None);
        }
        self.delegate.get(key)
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.clear_when_stale()?;
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        *self.last_clear.lock() = self.clock.now();
        self.delegate.clear()
    }

    fn size(&self) -> Result<usize> {
        self.clear_when_stale()?;
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{store::BaseStore, types::Value};
    use crate::clock::ManualClock;

    fn key(n: i64) -> CacheKey {
        CacheKey::from_parts([Value::Int(n)])
    }

    fn setup() -> (Arc<ManualClock>, ScheduledCache) {
        let clock = Arc::new(ManualClock::default());
        let cache = ScheduledCache::with_clock(Arc::new(BaseStore::new("scheduled")), clock.clone())
            .with_interval(Duration::minutes(10));
        (clock, cache)
    }

    #[test]
    fn test_no_clear_within_interval() {
        let (clock, cache) = setup();
        cache.put(key(1), Some(CacheValue::object(1))).unwrap();
        clock.advance(Duration::minutes(9));

        assert!(cache.get(&key(1)).unwrap().is_some());
        assert_eq!(cache.size().unwrap(), 1);
    }

    #[test]
    fn test_stale_get_reports_absent() {
        let (clock, cache) = setup();
        cache.put(key(1), Some(CacheValue::object(1))).unwrap();
        clock.advance(Duration::minutes(11));

        assert!(cache.get(&key(1)).unwrap().is_none());
        assert_eq!(cache.size().unwrap(), 0);
    }

    #[test]
    fn test_one_clear_per_tick() {
        let (clock, cache) = setup();
        cache.put(key(1), Some(CacheValue::object(1))).unwrap();
        clock.advance(Duration::minutes(11));

        // first operation in the tick clears; later ones see the new entry
        cache.put(key(2), Some(CacheValue::object(2))).unwrap();
        assert!(cache.get(&key(2)).unwrap().is_some());
        cache.put(key(3), Some(CacheValue::object(3))).unwrap();
        assert_eq!(cache.size().unwrap(), 2);
    }

    #[test]
    fn test_explicit_clear_resets_window() {
        let (clock, cache) = setup();
        clock.advance(Duration::minutes(8));
        cache.clear().unwrap();
        cache.put(key(1), Some(CacheValue::object(1))).unwrap();

        clock.advance(Duration::minutes(8));
        assert!(cache.get(&key(1)).unwrap().is_some());
    }
}
