//! # Cache Decorators
//!
//! Each decorator wraps exactly one inner [`Cache`](crate::cache::Cache) and
//! adds a single policy. Decorators own only their own bookkeeping, guarded
//! by their own lock, and never reach into a sibling's state, so they stack
//! in any order:
//!
//! | Decorator | Policy |
//! |-----------|--------|
//! | [`FifoCache`] | bounded, evicts in insertion order |
//! | [`LruCache`] | bounded, evicts least recently touched |
//! | [`ReferenceCache`] | soft/weak tiers with a reclamation queue |
//! | [`ScheduledCache`] | full clear once per interval |
//! | [`SerializedCache`] | defensive copy on every read |
//! | [`LoggingCache`] | hit-ratio tracking |
//! | [`SynchronizedCache`] | one lock around the whole stack below |
//! | [`BlockingCache`] | per-key lock from miss to fill |

pub mod blocking;
pub mod fifo;
pub mod logging;
pub mod lru;
pub mod reference;
pub mod scheduled;
pub mod serialized;
pub mod synchronized;

pub use blocking::BlockingCache;
pub use fifo::FifoCache;
pub use logging::LoggingCache;
pub use self::lru::LruCache;
pub use reference::{ReferenceCache, Referent, Strength};
pub use scheduled::ScheduledCache;
pub use serialized::SerializedCache;
pub use synchronized::SynchronizedCache;
