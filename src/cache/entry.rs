//! Cache Entry Module
//!
//! Defines the structure for individual cache entries: a value tagged as
//! item or list, with TTL support, plus the record helpers used for
//! cross-reference matching.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Entry Value ==
/// The stored value of a cache entry, tagged by shape.
///
/// The shape is inferred once when the entry is created (an array becomes
/// a `List`, anything else an `Item`) and never changes for that key.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// A single record
    Item(Value),
    /// An ordered collection of records
    List(Vec<Value>),
}

impl EntryValue {
    /// Infers the shape from the runtime form of `value`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(elements) => EntryValue::List(elements),
            other => EntryValue::Item(other),
        }
    }

    /// Returns true if this is a list entry.
    pub fn is_list(&self) -> bool {
        matches!(self, EntryValue::List(_))
    }

    /// Reassembles the stored value as a `serde_json::Value`.
    pub fn to_value(&self) -> Value {
        match self {
            EntryValue::Item(value) => value.clone(),
            EntryValue::List(elements) => Value::Array(elements.clone()),
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and expiration metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, tagged by shape
    pub value: EntryValue,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with its shape inferred from `value`.
    ///
    /// The effective TTL is `ttl_ms` if supplied, else `default_ttl_ms`.
    /// An effective TTL of zero means the entry never expires. The
    /// expiration timestamp is computed once here and never recomputed,
    /// not even when the entry is later updated in place.
    ///
    /// # Arguments
    /// * `value` - The value to store (array becomes a list entry)
    /// * `ttl_ms` - Optional per-call TTL in milliseconds
    /// * `default_ttl_ms` - Fallback TTL in milliseconds (0 = never expire)
    pub fn new(value: Value, ttl_ms: Option<u64>, default_ttl_ms: u64) -> Self {
        let now = current_timestamp_ms();
        let effective_ttl = ttl_ms.unwrap_or(default_ttl_ms);
        let expires_at = (effective_ttl > 0).then(|| now + effective_ttl);

        Self {
            value: EntryValue::from_value(value),
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired only once the current time
    /// strictly exceeds the expiration timestamp. Entries without a
    /// timestamp never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            if expires > now {
                expires - now
            } else {
                0
            }
        })
    }
}

// == Record Helpers ==
/// Returns the identity token of `record`: its `id_field` member,
/// stringified. Strings are used verbatim; other values use their JSON
/// rendering. A record without the field (including any non-object) has
/// no token and never matches a cross-reference.
pub(crate) fn id_token(record: &Value, id_field: &str) -> Option<String> {
    match record.get(id_field)? {
        Value::String(token) => Some(token.clone()),
        other => Some(other.to_string()),
    }
}

/// Shallow-copies every field of `src` onto `dst` in place.
///
/// New fields are added, existing fields overwritten, and fields absent
/// from `src` are left untouched. If either side is not an object there
/// are no fields to copy and the call is a no-op.
pub(crate) fn merge_fields(dst: &mut Value, src: &Value) {
    if let (Some(dst_fields), Some(src_fields)) = (dst.as_object_mut(), src.as_object()) {
        for (field, value) in src_fields {
            dst_fields.insert(field.clone(), value.clone());
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(json!({"id": 1}), None, 0);

        assert_eq!(entry.value, EntryValue::Item(json!({"id": 1})));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_default_ttl() {
        let entry = CacheEntry::new(json!({"id": 1}), None, 60_000);

        assert!(entry.expires_at.is_some());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_per_call_ttl_overrides_default() {
        let entry = CacheEntry::new(json!({"id": 1}), Some(5_000), 60_000);

        let remaining = entry.ttl_remaining_ms().unwrap();
        assert!(remaining <= 5_000);
        assert!(remaining >= 4_000);
    }

    #[test]
    fn test_entry_per_call_zero_ttl_never_expires() {
        let entry = CacheEntry::new(json!({"id": 1}), Some(0), 60_000);

        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_entry_shape_inference() {
        let item = CacheEntry::new(json!({"id": 1}), None, 0);
        let list = CacheEntry::new(json!([{"id": 1}, {"id": 2}]), None, 0);

        assert!(!item.value.is_list());
        assert!(list.value.is_list());
    }

    #[test]
    fn test_entry_value_roundtrip() {
        let value = json!([{"id": 1}, {"id": 2}]);
        let entry = CacheEntry::new(value.clone(), None, 0);

        assert_eq!(entry.value.to_value(), value);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!({"id": 1}), Some(50), 0);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_is_strict() {
        let now = current_timestamp_ms();

        let past = CacheEntry {
            value: EntryValue::Item(json!({"id": 1})),
            created_at: now,
            expires_at: Some(now - 1),
        };
        let future = CacheEntry {
            value: EntryValue::Item(json!({"id": 1})),
            created_at: now,
            expires_at: Some(now + 60_000),
        };

        assert!(past.is_expired());
        assert!(!future.is_expired());
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        let entry = CacheEntry::new(json!({"id": 1}), None, 0);

        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = CacheEntry::new(json!({"id": 1}), Some(10), 0);

        sleep(Duration::from_millis(40));

        assert_eq!(entry.ttl_remaining_ms().unwrap(), 0);
    }

    #[test]
    fn test_id_token_string_verbatim() {
        let record = json!({"id": "abc"});
        assert_eq!(id_token(&record, "id"), Some("abc".to_string()));
    }

    #[test]
    fn test_id_token_number_stringified() {
        let record = json!({"id": 42});
        assert_eq!(id_token(&record, "id"), Some("42".to_string()));
    }

    #[test]
    fn test_id_token_matches_across_representations() {
        // A numeric id and its string form compare equal once stringified.
        let numeric = json!({"id": 7});
        let text = json!({"id": "7"});

        assert_eq!(id_token(&numeric, "id"), id_token(&text, "id"));
    }

    #[test]
    fn test_id_token_missing_field() {
        let record = json!({"name": "abc"});
        assert_eq!(id_token(&record, "id"), None);
    }

    #[test]
    fn test_id_token_non_object() {
        assert_eq!(id_token(&json!("abc"), "id"), None);
        assert_eq!(id_token(&json!([1, 2]), "id"), None);
    }

    #[test]
    fn test_id_token_custom_field() {
        let record = json!({"uuid": "u-1", "id": "ignored"});
        assert_eq!(id_token(&record, "uuid"), Some("u-1".to_string()));
    }

    #[test]
    fn test_merge_fields_adds_and_overwrites() {
        let mut dst = json!({"a": 1, "b": 2});
        merge_fields(&mut dst, &json!({"b": 3, "c": 4}));

        assert_eq!(dst, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_fields_non_object_source_is_noop() {
        let mut dst = json!({"a": 1});
        merge_fields(&mut dst, &json!([1, 2, 3]));
        merge_fields(&mut dst, &json!("text"));

        assert_eq!(dst, json!({"a": 1}));
    }

    #[test]
    fn test_merge_fields_non_object_target_is_noop() {
        let mut dst = json!("text");
        merge_fields(&mut dst, &json!({"a": 1}));

        assert_eq!(dst, json!("text"));
    }
}
