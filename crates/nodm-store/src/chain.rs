//! Fallback chain of storage backends.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{Entry, Filter, Record};
use crate::traits::StorageBackend;

/// An ordered list of backends acting as one.
///
/// - Reads try each backend in order; the first hit wins. `NotFound` is
///   returned only when every backend misses. Any other error stops the
///   lookup immediately.
/// - Writes (single and batched) always go to the first backend.
/// - Name queries return the sorted union across all backends.
pub struct ChainStore {
    backends: Vec<Box<dyn StorageBackend>>,
}

impl ChainStore {
    /// Build a chain. At least one backend is required.
    pub fn new(backends: Vec<Box<dyn StorageBackend>>) -> StoreResult<Self> {
        if backends.is_empty() {
            return Err(StoreError::InvalidConfig(
                "a backend chain needs at least one backend".into(),
            ));
        }
        Ok(Self { backends })
    }

    /// Number of chained backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always `false`: construction rejects empty chains.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    fn head(&self) -> &dyn StorageBackend {
        // `new` guarantees at least one element.
        self.backends[0].as_ref()
    }
}

impl StorageBackend for ChainStore {
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record> {
        for (position, backend) in self.backends.iter().enumerate() {
            match backend.get_item(section, name) {
                Ok(record) => return Ok(record),
                Err(e) if e.is_not_found() => {
                    debug!(section, name, position, "chain lookup missed; falling through");
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::not_found(section, name))
    }

    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()> {
        self.head().set_item(section, name, record)
    }

    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        self.head().update(entries)
    }

    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for backend in &self.backends {
            names.extend(backend.query_names(section, filter)?);
        }
        Ok(names.into_iter().collect())
    }
}

impl std::fmt::Debug for ChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainStore")
            .field("backends", &self.backends.len())
            .finish()
    }
}
