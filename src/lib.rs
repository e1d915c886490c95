//! linkcache - An in-memory cache that keeps list entries synchronized
//! with their item entries
//!
//! Entries are keyed by a type namespace and a key, and hold either a
//! single record (an item) or an ordered collection of records (a list).
//! Updating or removing an item patches or splices the matching record
//! inside every list of its namespace, with lazy TTL expiration on reads.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, CacheStats, CacheStore, EntryValue, Namespace};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
