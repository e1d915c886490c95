//! Configuration Module
//!
//! Handles loading and managing engine configuration from environment variables.

use std::env;

use crate::cache::DEFAULT_ID_FIELD;

/// Engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL in milliseconds for entries without an explicit TTL
    /// (0 = never expire)
    pub default_ttl_ms: u64,
    /// Name of the record field used for cross-referencing.
    ///
    /// Applies to every namespace of the engine; per-namespace identity
    /// fields are a known limitation.
    pub id_field: String,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LINKCACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0, never expire)
    /// - `LINKCACHE_ID_FIELD` - Identifying field name (default: "id")
    pub fn from_env() -> Self {
        Self {
            default_ttl_ms: env::var("LINKCACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            id_field: env::var("LINKCACHE_ID_FIELD")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 0,
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}
