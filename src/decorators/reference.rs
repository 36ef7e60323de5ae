//! Soft and weak reference tiers
//!
//! Every stored value is wrapped in an [`Referent`] owned by this decorator;
//! the inner cache only receives a `Weak` handle to it. A referent stays
//! alive while it sits in one of two strong structures:
//!
//! - the hard-link ring of the most recently retrieved values
//! - the retention tier: a bounded LRU of stored/retrieved values for the
//!   soft strength, a much smaller insertion-ordered ring for the weak one
//!
//! Once both let go, the referent is dropped and its key lands on the
//! reclamation queue. The queue is drained before each write, removal and
//! size query; reclamation is therefore driven by access pattern and size
//! pressure rather than by memory pressure.

use crate::cache::{key::CacheKey, types::CacheValue, Cache};
use crate::error::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use lru::LruCache as Retention;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Default size of the ring of recently retrieved values
pub const DEFAULT_HARD_LINKS: usize = 256;

/// Default retention for the soft tier
pub const DEFAULT_SOFT_RETENTION: usize = 1024;

/// Default retention for the weak tier
pub const DEFAULT_WEAK_RETENTION: usize = 32;

/// How eagerly a reference tier gives up its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Values survive while recently stored or used
    Soft,
    /// Values survive only while among the few most recently stored or retrieved
    Weak,
}

type Reclaimed = (CacheKey, u64);

/// A reclaimable wrapper around a stored value
#[derive(Debug)]
pub struct Referent {
    id: u64,
    key: CacheKey,
    value: CacheValue,
    queue: Sender<Reclaimed>,
}

impl Referent {
    pub fn value(&self) -> &CacheValue {
        &self.value
    }
}

impl Drop for Referent {
    fn drop(&mut self) {
        // The receiver lives as long as the owning decorator.
        let _ = self.queue.send((self.key.clone(), self.id));
    }
}

/// Reference-eligible cache decorator (soft or weak strength)
pub struct ReferenceCache {
    delegate: Arc<dyn Cache>,
    strength: Strength,
    state: Mutex<ReferenceState>,
    next_id: AtomicU64,
    queue_tx: Sender<Reclaimed>,
    queue_rx: Receiver<Reclaimed>,
}

struct ReferenceState {
    hard_links: VecDeque<Arc<Referent>>,
    hard_link_limit: usize,
    retained: Retention<CacheKey, Arc<Referent>>,
    retention_limit: usize,
    /// Id of the referent currently stored under each key
    live: HashMap<CacheKey, u64>,
}

impl ReferenceCache {
    pub fn soft(delegate: Arc<dyn Cache>) -> Self {
        Self::new(delegate, Strength::Soft)
    }

    pub fn weak(delegate: Arc<dyn Cache>) -> Self {
        Self::new(delegate, Strength::Weak)
    }

    pub fn new(delegate: Arc<dyn Cache>, strength: Strength) -> Self {
        let retention_limit = match strength {
            Strength::Soft => DEFAULT_SOFT_RETENTION,
            Strength::Weak => DEFAULT_WEAK_RETENTION,
        };
        let (queue_tx, queue_rx) = unbounded();

        Self {
            delegate,
            strength,
            state: Mutex::new(ReferenceState {
                hard_links: VecDeque::new(),
                hard_link_limit: DEFAULT_HARD_LINKS,
                retained: Retention::unbounded(),
                retention_limit,
                live: HashMap::new(),
            }),
            next_id: AtomicU64::new(0),
            queue_tx,
            queue_rx,
        }
    }

    /// Set the number of recently retrieved values kept strongly reachable
    pub fn with_hard_links(self, limit: usize) -> Self {
        {
            let mut state = self.state.lock();
            state.hard_link_limit = limit;
            while state.hard_links.len() > limit {
                state.hard_links.pop_back();
            }
        }
        self
    }

    /// Set the number of stored values the retention tier keeps alive
    pub fn with_retention(self, limit: usize) -> Self {
        {
            let mut state = self.state.lock();
            state.retention_limit = limit;
            while state.retained.len() > limit {
                state.retained.pop_lru();
            }
        }
        self
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Remove from the inner cache every key whose current referent was dropped
    fn remove_reclaimed_items(&self) -> Result<()> {
        let reclaimed: Vec<Reclaimed> = self.queue_rx.try_iter().collect();
        if reclaimed.is_empty() {
            return Ok(());
        }

        let mut stale = Vec::new();
        {
            let mut state = self.state.lock();
            for (key, id) in reclaimed {
                if state.live.get(&key) == Some(&id) {
                    state.live.remove(&key);
                    stale.push(key);
                }
            }
        }

        for key in stale {
            debug!(region = %self.id(), key = %key, "Removing reclaimed entry");
            self.delegate.remove(&key)?;
        }
        Ok(())
    }

    fn retain(&self, key: CacheKey, referent: Arc<Referent>) {
        let mut state = self.state.lock();
        state.live.insert(key.clone(), referent.id);
        state.retained.put(key, referent);
        while state.retained.len() > state.retention_limit {
            state.retained.pop_lru();
        }
    }
}

impl Cache for ReferenceCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()> {
        self.remove_reclaimed_items()?;

        let Some(value) = value else {
            self.state.lock().live.remove(&key);
            return self.delegate.put(key, None);
        };

        let referent = Arc::new(Referent {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            key: key.clone(),
            value,
            queue: self.queue_tx.clone(),
        });
        self.delegate
            .put(key.clone(), Some(CacheValue::Reference(Arc::downgrade(&referent))))?;
        self.retain(key, referent);
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        let Some(stored) = self.delegate.get(key)? else {
            return Ok(None);
        };
        let CacheValue::Reference(handle) = stored else {
            // written below this decorator; pass it through untouched
            return Ok(Some(stored));
        };

        match handle.upgrade() {
            None => {
                debug!(region = %self.id(), key = %key, "Referent reclaimed before read");
                {
                    let mut state = self.state.lock();
                    state.live.remove(key);
                }
                self.delegate.remove(key)?;
                Ok(None)
            }
            Some(referent) => {
                let value = referent.value.clone();
                let mut state = self.state.lock();
                if self.strength == Strength::Soft {
                    state.retained.get(key);
                }
                state.hard_links.push_front(referent);
                if state.hard_links.len() > state.hard_link_limit {
                    state.hard_links.pop_back();
                }
                Ok(Some(value))
            }
        }
    }

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>> {
        self.remove_reclaimed_items()?;
        // held until the removed handle has been resolved
        let _retained = {
            let mut state = self.state.lock();
            state.live.remove(key);
            state.retained.pop(key)
        };
        let removed = self.delegate.remove(key)?;
        Ok(match removed {
            Some(CacheValue::Reference(handle)) => handle.upgrade().map(|r| r.value.clone()),
            other => other,
        })
    }

    fn clear(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.hard_links.clear();
            state.retained.clear();
        }
        self.remove_reclaimed_items()?;
        self.delegate.clear()?;
        self.state.lock().live.clear();
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        self.remove_reclaimed_items()?;
        self.delegate.size()
    }
}
