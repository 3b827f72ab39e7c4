//! Per-operation caches for the write and read paths.
//!
//! Both caches are plain values owned by the caller (or by a single
//! [`Database`](crate::Database) call). Nothing here is process-wide.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use nodm_model::{AnyReferenceable, Record, Referenceable};
use nodm_store::Entry;

// ---------------------------------------------------------------------------
// WriteCache
// ---------------------------------------------------------------------------

struct Cached {
    entity: Arc<dyn AnyReferenceable>,
    record: Record,
}

/// Entities encoded so far in one write, keyed by `(section, name)`.
///
/// Committing a write flushes every entry in the cache, including entries
/// left by earlier writes that shared it. A write that fails may leave
/// partial entries behind; discard the cache in that case.
#[derive(Default)]
pub struct WriteCache {
    entries: BTreeMap<(String, String), Cached>,
}

impl WriteCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entity has been encoded under `(section, name)`.
    pub fn contains(&self, section: &str, name: &str) -> bool {
        self.entries
            .contains_key(&(section.to_string(), name.to_string()))
    }

    /// The encoded record cached for `(section, name)`.
    pub fn record(&self, section: &str, name: &str) -> Option<&Record> {
        self.lookup(section, name).map(|c| &c.record)
    }

    /// Cached keys in `(section, name)` order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.keys().map(|(s, n)| (s.as_str(), n.as_str()))
    }

    pub(crate) fn entity(&self, section: &str, name: &str) -> Option<&Arc<dyn AnyReferenceable>> {
        self.lookup(section, name).map(|c| &c.entity)
    }

    pub(crate) fn insert(&mut self, entity: Arc<dyn AnyReferenceable>, record: Record) {
        let key = (entity.section().to_string(), entity.entity_name().to_string());
        self.entries.insert(key, Cached { entity, record });
    }

    /// The batch handed to the storage backend on commit.
    pub(crate) fn to_entries(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .map(|((section, name), c)| Entry::new(section.as_str(), name.as_str(), c.record.clone()))
            .collect()
    }

    fn lookup(&self, section: &str, name: &str) -> Option<&Cached> {
        self.entries.get(&(section.to_string(), name.to_string()))
    }
}

impl fmt::Debug for WriteCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// ReadCache
// ---------------------------------------------------------------------------

type ReadKey = (TypeId, String);

/// Entities decoded so far, keyed by `(type, name)`.
///
/// Reads that share a cache return the same `Arc` for the same key, so
/// sharing in the stored graph becomes sharing in memory.
#[derive(Default)]
pub struct ReadCache {
    decoded: HashMap<ReadKey, Arc<dyn Any + Send + Sync>>,
    in_progress: HashSet<ReadKey>,
}

impl ReadCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decoded entities.
    pub fn len(&self) -> usize {
        self.decoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoded.is_empty()
    }

    /// The cached `T` named `name`, if it has been read through this cache.
    pub fn get<T: Referenceable>(&self, name: &str) -> Option<Arc<T>> {
        self.decoded
            .get(&(TypeId::of::<T>(), name.to_string()))
            .and_then(|e| e.clone().downcast::<T>().ok())
    }

    pub(crate) fn lookup(&self, key: &ReadKey) -> Option<Arc<dyn Any + Send + Sync>> {
        self.decoded.get(key).cloned()
    }

    /// Mark `key` as being decoded. Returns `false` if it already is.
    pub(crate) fn begin(&mut self, key: ReadKey) -> bool {
        self.in_progress.insert(key)
    }

    pub(crate) fn finish(&mut self, key: &ReadKey, entity: Option<Arc<dyn Any + Send + Sync>>) {
        self.in_progress.remove(key);
        if let Some(entity) = entity {
            self.decoded.insert(key.clone(), entity);
        }
    }
}

impl fmt::Debug for ReadCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCache")
            .field("decoded", &self.decoded.len())
            .field("in_progress", &self.in_progress.len())
            .finish()
    }
}
