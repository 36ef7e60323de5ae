//! # Transactional Buffering
//!
//! A shared region cache must not expose a unit of work's writes to other
//! readers before that unit of work commits. Each unit of work therefore
//! talks to its regions through a [`TransactionalCacheManager`], which keeps
//! one [`TransactionalCache`] buffer per region it has touched.
//!
//! ```rust
//! use ouroboros_cache::cache::{BaseStore, Cache, CacheKey, CacheValue};
//! use ouroboros_cache::transaction::TransactionalCacheManager;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let region: Arc<dyn Cache> = Arc::new(BaseStore::new("users"));
//! let key = CacheKey::from_parts(["users.select_all"]);
//!
//! let mut tcm = TransactionalCacheManager::new();
//! if tcm.get(&region, &key)?.is_none() {
//!     tcm.put(&region, key.clone(), Some(CacheValue::object("rows")));
//! }
//! assert!(region.get(&key)?.is_none());
//!
//! tcm.commit()?;
//! assert!(region.get(&key)?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod manager;

pub use buffer::TransactionalCache;
pub use manager::TransactionalCacheManager;
