//! Cache Module
//!
//! Provides namespaced in-memory caching with TTL expiration and
//! item-to-list cross-reference synchronization.

mod entry;
mod namespace;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, EntryValue};
pub use namespace::Namespace;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default name of the identifying field used for cross-referencing
pub const DEFAULT_ID_FIELD: &str = "id";
