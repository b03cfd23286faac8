//! Cache Module
//!
//! Volatile, in-memory content cache with TTL expiration and LRU eviction.
//! Entries are keyed by content hash and never leave process memory.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{Blob, CacheEntry, ContentHash};
pub use lru::{LruTracker, NodeId};
pub use shared::ContentCache;
pub use stats::CacheStats;
pub use store::ContentStore;
