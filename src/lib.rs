//! # Ouroboros Cache (ouroboros-cache)
//!
//! A layered result cache for data-access frameworks. Each cache region is a
//! plain key/value store wrapped by a stack of single-purpose decorators, and
//! units of work see a region through a transactional buffer so that their
//! writes only become visible on commit.
//!
//! ## Features
//!
//! - Composite cache keys with order-sensitive identity
//! - FIFO, LRU, soft and weak eviction tiers
//! - Scheduled full clears driven by an injectable clock
//! - Serialized copies for read-write regions, hit-ratio logging
//! - Synchronized access and per-key blocking between a miss and its fill
//! - Transactional buffering with commit/rollback per unit of work
//! - JSON region configuration with build-time reference resolution
//!
//! ## Building a Region
//!
//! ```rust
//! use ouroboros_cache::{CacheBuilder, CacheKey, CacheValue, Layer};
//!
//! # fn example() -> anyhow::Result<()> {
//! let region = CacheBuilder::new("orders")
//!     .add_decorator(Layer::Fifo)
//!     .size(128)
//!     .read_write(true)
//!     .build()?;
//!
//! let key = CacheKey::from_parts(["orders.by_customer", "select * from orders"]);
//! region.put(key.clone(), Some(CacheValue::object(42)))?;
//! assert!(region.get(&key)?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Regions from Configuration
//!
//! ```rust
//! use ouroboros_cache::{CacheSettings, RegionRegistry};
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings = CacheSettings::from_json_str(r#"{
//!     "regions": [{ "id": "users", "eviction": "lru", "size": 512 }],
//!     "references": [{ "namespace": "admin", "target": "users" }]
//! }"#)?;
//!
//! let registry = RegionRegistry::build(&settings)?;
//! let admin = registry.get("admin").expect("resolved at build time");
//! assert_eq!(admin.id(), "users");
//! # Ok(())
//! # }
//! ```
//!
//! ## Units of Work
//!
//! ```rust
//! use ouroboros_cache::{CacheBuilder, CacheKey, CacheValue, TransactionalCacheManager};
//!
//! # fn example() -> anyhow::Result<()> {
//! let region = CacheBuilder::new("users").build()?;
//! let key = CacheKey::from_parts(["users.select_all"]);
//!
//! let mut tcm = TransactionalCacheManager::new();
//! tcm.put(&region, key.clone(), Some(CacheValue::object("rows")));
//! tcm.rollback();
//! assert!(region.get(&key)?.is_none());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod decorators;
pub mod error;
pub mod transaction;

// Re-export main types for convenience
pub use cache::{
    BaseStore, Cache, CacheBuilder, CacheKey, CacheSettings, CacheValue, Eviction, Handle, Layer,
    RegionConfig, RegionRef, RegionRegistry, RowBounds, Value,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, Result};
pub use transaction::{TransactionalCache, TransactionalCacheManager};
