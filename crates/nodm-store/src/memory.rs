//! In-memory storage backend for tests and embedding.
//!
//! [`InMemoryStore`] keeps every section in a `BTreeMap` behind a `RwLock`.
//! Data is lost when the store is dropped.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::names::validate_key;
use crate::record::{filter_matches, Entry, Filter, Record};
use crate::traits::StorageBackend;

/// Every stored record, grouped by section and then by name.
pub type Sections = BTreeMap<String, BTreeMap<String, Record>>;

/// An in-memory implementation of [`StorageBackend`].
///
/// Records are cloned on read and write. Batches are applied under a single
/// write lock, so readers never observe half of an `update`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sections: RwLock<Sections>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `sections`.
    pub fn from_sections(sections: Sections) -> Self {
        Self {
            sections: RwLock::new(sections),
        }
    }

    /// Number of records across all sections.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_lock()?.values().map(BTreeMap::len).sum())
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted list of sections holding at least one record.
    pub fn sections(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .read_lock()?
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(section, _)| section.clone())
            .collect())
    }

    /// A copy of the full contents.
    pub fn snapshot(&self) -> StoreResult<Sections> {
        Ok(self.read_lock()?.clone())
    }

    /// Remove every record.
    pub fn clear(&self) -> StoreResult<()> {
        self.write_lock()?.clear();
        Ok(())
    }

    fn read_lock(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Sections>> {
        self.sections
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write_lock(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Sections>> {
        self.sections
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl StorageBackend for InMemoryStore {
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record> {
        self.read_lock()?
            .get(section)
            .and_then(|names| names.get(name))
            .cloned()
            .ok_or_else(|| StoreError::not_found(section, name))
    }

    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()> {
        validate_key(section, name)?;
        self.write_lock()?
            .entry(section.to_string())
            .or_default()
            .insert(name.to_string(), record.clone());
        Ok(())
    }

    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        // Validate everything first so a bad key leaves the store untouched.
        for entry in entries {
            validate_key(&entry.section, &entry.name)?;
        }
        let mut sections = self.write_lock()?;
        for entry in entries {
            sections
                .entry(entry.section.clone())
                .or_default()
                .insert(entry.name.clone(), entry.record.clone());
        }
        Ok(())
    }

    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>> {
        let sections = self.read_lock()?;
        let Some(names) = sections.get(section) else {
            return Ok(Vec::new());
        };
        Ok(names
            .iter()
            .filter(|(_, record)| filter_matches(filter, record))
            .map(|(name, _)| name.clone())
            .collect())
    }
}
