//! Namespace Module
//!
//! One type namespace: the entry map plus an insertion-ordered index of
//! list-entry keys.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, EntryValue};

// == Namespace ==
/// A single type namespace.
///
/// Entries live in one map; the item/list classification is carried by the
/// tag on each entry's value, so a key is an item or a list but never both.
/// `list_keys` records the insertion order of list entries, which fixes the
/// order lists are visited during propagation, purge and append.
#[derive(Debug, Default)]
pub struct Namespace {
    /// Every entry of the namespace, keyed by cache key
    entries: HashMap<String, CacheEntry>,
    /// Keys of list entries, in insertion order
    list_keys: Vec<String>,
}

impl Namespace {
    // == Constructor ==
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Returns the entry stored at `key`, regardless of shape.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Mutable access to the entry stored at `key`.
    pub fn entry_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        self.entries.get_mut(key)
    }

    /// Checks whether any entry is stored at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Insert ==
    /// Registers a freshly created entry, indexing its key if it is a list.
    ///
    /// Callers only insert under keys that are not already present; an
    /// existing entry is always mutated in place instead of replaced.
    pub fn insert(&mut self, key: String, entry: CacheEntry) {
        if entry.value.is_list() && !self.list_keys.iter().any(|k| k == &key) {
            self.list_keys.push(key.clone());
        }
        self.entries.insert(key, entry);
    }

    // == Remove ==
    /// Removes and returns the entry at `key`, dropping its list index.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        if entry.value.is_list() {
            self.list_keys.retain(|k| k != key);
        }
        Some(entry)
    }

    // == List Traversal ==
    /// Keys of the namespace's list entries, in insertion order.
    pub fn list_keys(&self) -> &[String] {
        &self.list_keys
    }

    /// Visits every list sequence mutably, in insertion order of list keys.
    pub fn for_each_list<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Vec<Value>),
    {
        let Namespace { entries, list_keys } = self;
        for key in list_keys.iter() {
            if let Some(CacheEntry {
                value: EntryValue::List(elements),
                ..
            }) = entries.get_mut(key)
            {
                visit(elements);
            }
        }
    }

    // == Iteration ==
    /// Iterates over every entry of the namespace.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    // == Length ==
    /// Returns the number of entries in the namespace.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the namespace holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_of(value: Value) -> CacheEntry {
        CacheEntry::new(value, None, 0)
    }

    #[test]
    fn test_namespace_new() {
        let namespace = Namespace::new();
        assert!(namespace.is_empty());
        assert!(namespace.list_keys().is_empty());
    }

    #[test]
    fn test_insert_indexes_lists_only() {
        let mut namespace = Namespace::new();

        namespace.insert("user:1".to_string(), entry_of(json!({"id": 1})));
        namespace.insert("all".to_string(), entry_of(json!([{"id": 1}])));

        assert_eq!(namespace.len(), 2);
        assert_eq!(namespace.list_keys(), ["all".to_string()]);
    }

    #[test]
    fn test_list_keys_preserve_insertion_order() {
        let mut namespace = Namespace::new();

        namespace.insert("b".to_string(), entry_of(json!([])));
        namespace.insert("a".to_string(), entry_of(json!([])));
        namespace.insert("c".to_string(), entry_of(json!([])));

        assert_eq!(
            namespace.list_keys(),
            ["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_remove_drops_list_index() {
        let mut namespace = Namespace::new();

        namespace.insert("a".to_string(), entry_of(json!([])));
        namespace.insert("b".to_string(), entry_of(json!([])));

        let removed = namespace.remove("a");
        assert!(removed.is_some());
        assert_eq!(namespace.list_keys(), ["b".to_string()]);
    }

    #[test]
    fn test_remove_nonexistent() {
        let mut namespace = Namespace::new();
        assert!(namespace.remove("missing").is_none());
    }

    #[test]
    fn test_for_each_list_visits_in_order() {
        let mut namespace = Namespace::new();

        namespace.insert("second".to_string(), entry_of(json!([{"id": 2}])));
        namespace.insert("first".to_string(), entry_of(json!([{"id": 1}])));
        namespace.insert("user:1".to_string(), entry_of(json!({"id": 1})));

        let mut seen = Vec::new();
        namespace.for_each_list(|elements| {
            seen.push(elements[0]["id"].clone());
        });

        // Item entries are skipped; lists come back in insertion order.
        assert_eq!(seen, vec![json!(2), json!(1)]);
    }

    #[test]
    fn test_for_each_list_mutation_sticks() {
        let mut namespace = Namespace::new();

        namespace.insert("all".to_string(), entry_of(json!([{"id": 1}])));
        namespace.for_each_list(|elements| elements.push(json!({"id": 2})));

        let entry = namespace.entry("all").unwrap();
        assert_eq!(entry.value.to_value(), json!([{"id": 1}, {"id": 2}]));
    }
}
