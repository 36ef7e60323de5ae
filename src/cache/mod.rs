//! # Layered Result Cache
//!
//! This module defines the cache contract shared by every layer of a region's
//! stack, together with the key and value types that flow through it.
//!
//! ## Architecture
//!
//! A region is a [`BaseStore`] wrapped by an ordered stack of decorators (see
//! [`crate::decorators`]). Each decorator implements [`Cache`] itself and
//! delegates to one inner `Arc<dyn Cache>`, so any policy can sit at any
//! position in the stack:
//!
//! - Eviction: FIFO, LRU, soft and weak reference tiers
//! - Time: scheduled full clears
//! - Value safety: serialized copies, hit-ratio logging
//! - Concurrency: synchronized access, per-key blocking
//!
//! Two cache handles are equal when their region ids are equal, regardless
//! of how each is wrapped.
//!
//! ## Example
//!
//! ```rust
//! use ouroboros_cache::cache::{CacheBuilder, CacheKey, CacheValue, Value};
//!
//! # fn example() -> anyhow::Result<()> {
//! let region = CacheBuilder::new("users").size(512).build()?;
//!
//! let key = CacheKey::from_parts(["users.select_all", "select * from users"]);
//! region.put(key.clone(), Some(CacheValue::object("cached rows")))?;
//!
//! if let Some(value) = region.get(&key)? {
//!     println!("Cache hit: {:?}", value.as_object());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod key;
pub mod registry;
pub mod store;
pub mod types;

use crate::error::Result;
use std::hash::{Hash, Hasher};

pub use builder::{CacheBuilder, Layer};
pub use config::{CacheSettings, Eviction, RegionConfig, RegionRef};
pub use key::{CacheKey, RowBounds};
pub use registry::RegionRegistry;
pub use store::BaseStore;
pub use types::{CacheValue, Handle, Value};

/// The contract every cache layer implements
pub trait Cache: Send + Sync {
    /// Region identifier; stable for the lifetime of the cache
    fn id(&self) -> &str;

    /// Store a value; `None` writes an explicit null marker
    fn put(&self, key: CacheKey, value: Option<CacheValue>) -> Result<()>;

    fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>>;

    fn remove(&self, key: &CacheKey) -> Result<Option<CacheValue>>;

    fn clear(&self) -> Result<()>;

    /// Number of entries held, null markers included
    fn size(&self) -> Result<usize>;
}

impl<'a> PartialEq for dyn Cache + 'a {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<'a> Eq for dyn Cache + 'a {}

impl<'a> Hash for dyn Cache + 'a {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
