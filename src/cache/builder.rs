//! Assembly of a region's decorator stack

use crate::cache::config::{Eviction, RegionConfig};
use crate::cache::{store::BaseStore, Cache};
use crate::clock::{Clock, SystemClock};
use crate::decorators::{
    fifo::DEFAULT_FIFO_SIZE, lru::DEFAULT_LRU_SIZE, BlockingCache, FifoCache, LoggingCache,
    LruCache, ReferenceCache, ScheduledCache, SerializedCache, SynchronizedCache,
};
use crate::error::{CacheError, Result};
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

/// One decorator in a region's stack
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Fifo,
    Lru,
    Soft,
    Weak,
    Scheduled { interval: Duration },
    Serialized,
    Logging,
    Synchronized,
    Blocking { timeout: Option<std::time::Duration> },
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Fifo => "fifo",
            Layer::Lru => "lru",
            Layer::Soft => "soft",
            Layer::Weak => "weak",
            Layer::Scheduled { .. } => "scheduled",
            Layer::Serialized => "serialized",
            Layer::Logging => "logging",
            Layer::Synchronized => "synchronized",
            Layer::Blocking { .. } => "blocking",
        }
    }
}

impl From<Eviction> for Layer {
    fn from(eviction: Eviction) -> Self {
        match eviction {
            Eviction::Lru => Layer::Lru,
            Eviction::Fifo => Layer::Fifo,
            Eviction::Soft => Layer::Soft,
            Eviction::Weak => Layer::Weak,
        }
    }
}

/// Builds a region: a [`BaseStore`] wrapped by an ordered decorator stack.
///
/// The standard stack, from the base store outwards, is: the caller's
/// decorators in insertion order (LRU when none were added), scheduled clear
/// when an interval is set, serialized copies for read-write regions, hit
/// ratio logging, synchronized access, and per-key blocking when requested.
/// With [`standard_decorators(false)`](Self::standard_decorators) only the
/// caller's decorators are applied.
///
/// ```rust
/// use ouroboros_cache::cache::{CacheBuilder, Layer};
///
/// # fn example() -> ouroboros_cache::error::Result<()> {
/// let region = CacheBuilder::new("orders")
///     .add_decorator(Layer::Fifo)
///     .size(256)
///     .read_write(true)
///     .build()?;
/// assert_eq!(region.id(), "orders");
/// # Ok(())
/// # }
/// ```
pub struct CacheBuilder {
    id: String,
    decorators: Vec<Layer>,
    size: Option<usize>,
    clear_interval: Option<Duration>,
    read_write: bool,
    blocking: bool,
    lock_timeout: Option<std::time::Duration>,
    clock: Option<Arc<dyn Clock>>,
    standard_decorators: bool,
}

impl CacheBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            decorators: Vec::new(),
            size: None,
            clear_interval: None,
            read_write: false,
            blocking: false,
            lock_timeout: None,
            clock: None,
            standard_decorators: true,
        }
    }

    /// Builder preconfigured from a region declaration
    pub fn from_config(config: &RegionConfig) -> Self {
        let mut builder = Self::new(config.id.clone())
            .add_decorator(config.eviction.into())
            .read_write(!config.read_only)
            .blocking(config.blocking);
        if let Some(size) = config.size {
            builder = builder.size(size);
        }
        if let Some(ms) = config.flush_interval_ms {
            builder = builder.clear_interval(Duration::milliseconds(ms as i64));
        }
        if let Some(ms) = config.lock_timeout_ms {
            builder = builder.lock_timeout(std::time::Duration::from_millis(ms));
        }
        builder
    }

    /// Append a decorator directly above the previously added ones
    pub fn add_decorator(mut self, layer: Layer) -> Self {
        self.decorators.push(layer);
        self
    }

    /// Capacity of FIFO/LRU layers and hard-link ring of reference layers
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn clear_interval(mut self, interval: Duration) -> Self {
        self.clear_interval = Some(interval);
        self
    }

    pub fn read_write(mut self, read_write: bool) -> Self {
        self.read_write = read_write;
        self
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn lock_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Time source for scheduled clearing
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn standard_decorators(mut self, enabled: bool) -> Self {
        self.standard_decorators = enabled;
        self
    }

    /// The layers `build` applies, innermost first
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers = self.decorators.clone();
        if !self.standard_decorators {
            return layers;
        }

        if layers.is_empty() {
            layers.push(Layer::Lru);
        }
        if let Some(interval) = self.clear_interval {
            layers.push(Layer::Scheduled { interval });
        }
        if self.read_write {
            layers.push(Layer::Serialized);
        }
        layers.push(Layer::Logging);
        layers.push(Layer::Synchronized);
        if self.blocking {
            layers.push(Layer::Blocking {
                timeout: self.lock_timeout,
            });
        }
        layers
    }

    pub fn build(self) -> Result<Arc<dyn Cache>> {
        if self.id.trim().is_empty() {
            return Err(CacheError::ConfigError("region id must not be empty".to_string()));
        }
        if self.size == Some(0) {
            return Err(CacheError::ConfigError(format!(
                "region '{}': size must be greater than 0",
                self.id
            )));
        }

        let layers = self.layers();
        let mut cache: Arc<dyn Cache> = Arc::new(BaseStore::new(self.id.clone()));
        for layer in &layers {
            cache = self.wrap(cache, layer);
        }

        debug!(
            region = %self.id,
            layers = ?layers.iter().map(Layer::name).collect::<Vec<_>>(),
            "Built cache region"
        );
        Ok(cache)
    }

    fn wrap(&self, inner: Arc<dyn Cache>, layer: &Layer) -> Arc<dyn Cache> {
        match layer {
            Layer::Fifo => Arc::new(FifoCache::with_size(
                inner,
                self.size.unwrap_or(DEFAULT_FIFO_SIZE),
            )),
            Layer::Lru => Arc::new(LruCache::with_size(
                inner,
                self.size.unwrap_or(DEFAULT_LRU_SIZE),
            )),
            Layer::Soft => Arc::new(self.reference_links(ReferenceCache::soft(inner))),
            Layer::Weak => Arc::new(self.reference_links(ReferenceCache::weak(inner))),
            Layer::Scheduled { interval } => {
                let clock = self
                    .clock
                    .clone()
                    .unwrap_or_else(|| Arc::new(SystemClock));
                Arc::new(ScheduledCache::with_clock(inner, clock).with_interval(*interval))
            }
            Layer::Serialized => Arc::new(SerializedCache::new(inner)),
            Layer::Logging => Arc::new(LoggingCache::new(inner)),
            Layer::Synchronized => Arc::new(SynchronizedCache::new(inner)),
            Layer::Blocking { timeout } => {
                let blocking = BlockingCache::new(inner);
                match timeout {
                    Some(timeout) => Arc::new(blocking.with_timeout(*timeout)),
                    None => Arc::new(blocking),
                }
            }
        }
    }

    fn reference_links(&self, cache: ReferenceCache) -> ReferenceCache {
        match self.size {
            Some(size) => cache.with_hard_links(size),
            None => cache,
        }
    }
}
