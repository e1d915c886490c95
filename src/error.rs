//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Miss reasons reported by the fallible lookup surface.
///
/// Mutating operations never fail: absent entries take the creation or
/// synthesis path, and malformed records simply never match a
/// cross-reference, turning the call into a no-op. Only lookups carry a
/// typed reason.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in its namespace
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key was present but its TTL has elapsed
    #[error("Key expired: {0}")]
    Expired(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
