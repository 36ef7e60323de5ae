//! Per-key locking for cache population
//!
//! When a lookup misses, the reader keeps the key's lock until it stores the
//! resolved value (or an explicit null). Concurrent readers of the same key
//! wait instead of all hitting the database. `remove` only releases the lock,
//! which is how an aborted unit of work hands the key back.

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::{CacheError, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cache decorator holding one lock per key between a miss and its fill
pub struct BlockingCache {
    delegate: Arc<dyn Cache>,
    timeout: Option<Duration>,
    locks: Mutex<HashMap<CacheKey, Arc<Latch>>>,
}

struct Latch {
    released: Mutex<bool>,
    signal: Condvar,
}

impl Latch {
    fn new() -> Self {
        Self {
            released: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    /// Returns false if the timeout elapsed first
    fn wait(&self, timeout: Option<Duration>) -> bool {
        let mut released = self.released.lock();
        while !*released {
            match timeout {
                Some(timeout) => {
                    if self.signal.wait_for(&mut released, timeout).timed_out() {
                        return *released;
                    }
                }
                None => self.signal.wait(&mut released),
            }
        }
        true
    }

    fn release(&self) {
        *self.released.lock() = true;
        self.signal.notify_all();
    }
}

impl BlockingCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self {
            delegate,
            timeout: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Bound how long a reader waits for another holder of the same key
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn acquire_lock(&self, key: &CacheKey) -> Result<()> {
        loop {
            let latch = {
                let mut locks = self.locks.lock();
                match locks.get(key) {
                    None => {
                        locks.insert(key.clone(), Arc::new(Latch::new()));
                        return Ok(());
                    }
                    Some(latch) => latch.clone(),
                }
            };

            debug!(region = %self.id(), key = %key, "Waiting for key lock");
            if !latch.wait(self.timeout) {
                return Err(CacheError::LockTimeout {
                    region: self.id().to_string(),
                    key: key.to_string(),
                    timeout_ms: self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
                });
            }
        }
    }

    fn release_lock(&self, key: &CacheKey) -> Result<()> {
        let latch = self.locks.lock().remove(key);
        match latch {
            Some(latch) => {
                latch.release();
                Ok(())
            }
            None => Err(CacheError::UnacquiredLock {
                region: self.id().to_string(),
                key: key.to_string(),
            }),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Cache for BlockingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        let stored = self.delegate.put(key.clone(), value);
        // writes without a preceding miss hold no lock
        let latch = self.locks.lock().remove(&key);
        if let Some(latch) = latch {
            latch.release();
        }
        stored
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.acquire_lock(key)?;
        match self.delegate.get(key) {
            Ok(Some(value)) => {
                self.release_lock(key)?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                let _ = self.release_lock(key);
                Err(e)
            }
        }
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.release_lock(key)?;
        Ok(None)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> Result<usize> {
        self.delegate.size()
    }
}
