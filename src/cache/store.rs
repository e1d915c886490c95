//! Cache Store Module
//!
//! The cache engine: a two-level store (type namespace, then key) that keeps
//! list entries synchronized with their item entries under insert, update,
//! removal and TTL expiration.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::entry::{id_token, merge_fields};
use crate::cache::{CacheEntry, CacheStats, EntryValue, Namespace};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// The synchronization engine.
///
/// Entries are keyed first by a type namespace, then by a key. Within a
/// namespace an entry holds either a single record (an item) or an ordered
/// collection of records (a list). Whenever an item record is updated or
/// removed, every list in the same namespace holding a record with the same
/// identity is patched or spliced to match.
///
/// All state is private to one instance; instances are fully independent.
/// Methods take `&mut self`: a single logical caller is assumed and any
/// sharing across threads must be serialized by the embedding application.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Type namespaces, created lazily on first write
    namespaces: HashMap<String, Namespace>,
    /// Performance statistics
    stats: CacheStats,
    /// Engine configuration (default TTL, identity field)
    config: CacheConfig,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            namespaces: HashMap::new(),
            stats: CacheStats::new(),
            config,
        }
    }

    // == Get ==
    /// Retrieves the value stored at `(kind, key)`.
    ///
    /// Returns `None` when the entry is absent or expired. An expired entry
    /// is evicted on the spot: it is dropped from its namespace and, if it
    /// held an item, its cross-referencing list elements are purged.
    pub fn get(&mut self, kind: &str, key: &str) -> Option<Value> {
        self.try_get(kind, key).ok()
    }

    /// Like [`CacheStore::get`], but reports why a lookup missed.
    pub fn try_get(&mut self, kind: &str, key: &str) -> Result<Value> {
        // Classify the lookup in one immutable pass; eviction needs &mut.
        let lookup = self
            .namespaces
            .get(kind)
            .and_then(|namespace| namespace.entry(key))
            .map(|entry| (!entry.is_expired()).then(|| entry.value.to_value()));

        match lookup {
            None => {
                self.stats.record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
            Some(None) => {
                debug!(kind, key, "evicting expired entry");
                self.evict(kind, key);
                self.stats.record_expiration();
                self.stats.record_miss();
                Err(CacheError::Expired(key.to_string()))
            }
            Some(Some(value)) => {
                self.stats.record_hit();
                Ok(value)
            }
        }
    }

    // == Set ==
    /// Stores `value` at `(kind, key)`.
    ///
    /// When the key is fresh an entry is created: the shape is inferred from
    /// the value (array becomes a list, anything else an item) and the
    /// expiration is computed from `ttl_ms`, falling back to the configured
    /// default. When the key already exists the call delegates to
    /// [`CacheStore::update`] semantics: the entry keeps its shape and its
    /// expiration, items field-merge and lists are replaced in place.
    pub fn set(&mut self, kind: &str, key: &str, value: Value, ttl_ms: Option<u64>) {
        if self.namespaces.get(kind).is_some_and(|ns| ns.contains(key)) {
            self.update(kind, key, value, ttl_ms);
            return;
        }

        let entry = CacheEntry::new(value, ttl_ms, self.config.default_ttl_ms);
        debug!(kind, key, list = entry.value.is_list(), "creating entry");
        self.namespace_mut(kind).insert(key.to_string(), entry);
    }

    // == Update ==
    /// Updates the entry at `(kind, key)` with `value`.
    ///
    /// Item entries shallow-merge: every field of `value` is copied onto the
    /// stored record (new fields added, existing overwritten, absent fields
    /// untouched), then the merged record is propagated into the last
    /// matching element of every list in the namespace. List entries are
    /// replaced wholesale: the stored sequence is cleared and refilled from
    /// `value` in place, without the entry being re-created. A non-array
    /// `value` on a list entry is a no-op.
    ///
    /// A missing entry is synthesized through the `set` create path,
    /// registered under its key, and propagated when its shape is an item.
    pub fn update(&mut self, kind: &str, key: &str, value: Value, ttl_ms: Option<u64>) {
        let Self {
            namespaces, config, ..
        } = self;
        let namespace = namespaces.entry(kind.to_string()).or_default();

        if !namespace.contains(key) {
            let entry = CacheEntry::new(value, ttl_ms, config.default_ttl_ms);
            debug!(
                kind,
                key,
                list = entry.value.is_list(),
                "synthesizing entry on update"
            );
            let record = match &entry.value {
                EntryValue::Item(record) => Some(record.clone()),
                EntryValue::List(_) => None,
            };
            namespace.insert(key.to_string(), entry);
            if let Some(record) = record {
                Self::propagate_record(namespace, &record, &config.id_field);
            }
            return;
        }

        let merged = match namespace.entry_mut(key) {
            Some(entry) => match &mut entry.value {
                EntryValue::Item(record) => {
                    merge_fields(record, &value);
                    Some(record.clone())
                }
                EntryValue::List(elements) => {
                    if let Value::Array(new_elements) = value {
                        elements.clear();
                        elements.extend(new_elements);
                    }
                    None
                }
            },
            None => None,
        };

        if let Some(record) = merged {
            Self::propagate_record(namespace, &record, &config.id_field);
        }
    }

    // == Update Record ==
    /// The keyless update shape: propagates `value`'s fields into the last
    /// matching element of every list in the namespace without touching any
    /// stored key. Non-item values are a no-op.
    pub fn update_record(&mut self, kind: &str, value: Value) {
        let Self {
            namespaces, config, ..
        } = self;
        let Some(namespace) = namespaces.get_mut(kind) else {
            return;
        };
        if let EntryValue::Item(record) = EntryValue::from_value(value) {
            Self::propagate_record(namespace, &record, &config.id_field);
        }
    }

    // == Add ==
    /// Appends `value` to the end of every existing list in the namespace.
    ///
    /// The record is appended unconditionally: no de-duplication and no
    /// cross-reference check, unlike propagation's patch-one-element rule.
    /// Non-item values, and namespaces without lists, are a no-op.
    pub fn add(&mut self, kind: &str, value: Value) {
        let Some(namespace) = self.namespaces.get_mut(kind) else {
            return;
        };
        let EntryValue::Item(record) = EntryValue::from_value(value) else {
            return;
        };

        let mut appended = 0usize;
        namespace.for_each_list(|elements| {
            elements.push(record.clone());
            appended += 1;
        });
        if appended > 0 {
            debug!(kind, appended, "appended record to lists");
        }
    }

    // == Remove ==
    /// Deletes the entry at `(kind, key)`.
    ///
    /// If the entry held an item, the last element matching the item's
    /// identity is spliced out of every list in the namespace.
    pub fn remove(&mut self, kind: &str, key: &str) {
        debug!(kind, key, "removing entry");
        self.evict(kind, key);
    }

    // == Remove Record ==
    /// The keyless remove shape: splices `record`'s cross-referencing
    /// element out of every list in the namespace without deleting any
    /// stored entry.
    pub fn remove_record(&mut self, kind: &str, record: &Value) {
        let Self {
            namespaces, config, ..
        } = self;
        let Some(namespace) = namespaces.get_mut(kind) else {
            return;
        };
        Self::purge_record(namespace, record, &config.id_field);
    }

    // == Clear ==
    /// Destroys every namespace and entry unconditionally.
    pub fn clear(&mut self) {
        debug!("clearing store");
        self.namespaces.clear();
    }

    // == Cleanup Expired ==
    /// Evicts every expired entry across all namespaces, purging list
    /// cross-references for expired items. Returns the number evicted.
    ///
    /// Expiry is otherwise only checked on reads; embedding applications
    /// wanting bounded staleness call this on their own schedule.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<(String, String)> = self
            .namespaces
            .iter()
            .flat_map(|(kind, namespace)| {
                namespace
                    .iter()
                    .filter(|(_, entry)| entry.is_expired())
                    .map(move |(key, _)| (kind.clone(), key.clone()))
            })
            .collect();

        let count = expired.len();
        for (kind, key) in expired {
            self.evict(&kind, &key);
            self.stats.record_expiration();
        }

        if count > 0 {
            debug!(count, "cleanup removed expired entries");
        }
        count
    }

    // == Stats ==
    /// Returns a snapshot of current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Length ==
    /// Total number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(Namespace::len).sum()
    }

    // == Is Empty ==
    /// Returns true if no namespace holds any entry.
    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(Namespace::is_empty)
    }

    // == Internals ==
    /// Lazily creates and returns the namespace for `kind`.
    fn namespace_mut(&mut self, kind: &str) -> &mut Namespace {
        self.namespaces.entry(kind.to_string()).or_default()
    }

    /// Drops the entry at `(kind, key)` and, if it held an item, purges its
    /// cross-referencing list elements. Per-key eviction stays internal;
    /// the public surface removes only through [`CacheStore::remove`],
    /// expiry and [`CacheStore::clear`].
    fn evict(&mut self, kind: &str, key: &str) {
        let Self {
            namespaces, config, ..
        } = self;
        let Some(namespace) = namespaces.get_mut(kind) else {
            return;
        };
        let Some(entry) = namespace.remove(key) else {
            return;
        };
        if let EntryValue::Item(record) = entry.value {
            Self::purge_record(namespace, &record, &config.id_field);
        }
    }

    /// Pushes `record`'s fields onto the last matching element of every
    /// list in the namespace: at most one element per list, lists visited
    /// in insertion order. Expiration is not checked here; an expired item
    /// keeps influencing list state until something reads it.
    fn propagate_record(namespace: &mut Namespace, record: &Value, id_field: &str) {
        let Some(token) = id_token(record, id_field) else {
            return;
        };
        let mut patched = 0usize;
        namespace.for_each_list(|elements| {
            if let Some(index) = Self::rfind_match(elements, &token, id_field) {
                merge_fields(&mut elements[index], record);
                patched += 1;
            }
        });
        if patched > 0 {
            debug!(patched, "propagated item fields into list elements");
        }
    }

    /// Splices the last element matching `record`'s identity out of every
    /// list in the namespace, at most one element per list.
    fn purge_record(namespace: &mut Namespace, record: &Value, id_field: &str) {
        let Some(token) = id_token(record, id_field) else {
            return;
        };
        let mut purged = 0usize;
        namespace.for_each_list(|elements| {
            if let Some(index) = Self::rfind_match(elements, &token, id_field) {
                elements.remove(index);
                purged += 1;
            }
        });
        if purged > 0 {
            debug!(purged, "purged cross-referencing list elements");
        }
    }

    /// Index of the last element whose identity token equals `token`,
    /// scanning from the end of the sequence.
    fn rfind_match(elements: &[Value], token: &str, id_field: &str) -> Option<usize> {
        elements
            .iter()
            .rposition(|element| id_token(element, id_field).as_deref() == Some(token))
    }
}
