use crate::error::StoreResult;
use crate::record::{Entry, Filter, Record};

/// Flat key-value storage addressed by `(section, name)`.
///
/// All implementations must satisfy these invariants:
/// - A record read back is equal to the record last written under its key.
/// - `get_item` on a missing key fails with [`StoreError::NotFound`], never
///   with an empty record.
/// - The store never interprets record contents except to evaluate a
///   [`Filter`] in `query_names`.
/// - All I/O errors are propagated, never silently ignored.
///
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
pub trait StorageBackend: Send + Sync {
    /// Read the record stored under `(section, name)`.
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record>;

    /// Create or replace the record stored under `(section, name)`.
    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()>;

    /// Commit a batch of entries.
    ///
    /// Default implementation calls `set_item()` for each entry in order.
    /// Backends may override to apply the batch atomically or with a single
    /// flush.
    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        entries
            .iter()
            .try_for_each(|e| self.set_item(&e.section, &e.name, &e.record))
    }

    /// Names in `section` whose records match `filter`.
    ///
    /// A missing section yields an empty list.
    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>>;
}

impl<S: StorageBackend + ?Sized> StorageBackend for Box<S> {
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record> {
        (**self).get_item(section, name)
    }

    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()> {
        (**self).set_item(section, name, record)
    }

    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        (**self).update(entries)
    }

    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>> {
        (**self).query_names(section, filter)
    }
}

impl<S: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<S> {
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record> {
        (**self).get_item(section, name)
    }

    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()> {
        (**self).set_item(section, name, record)
    }

    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        (**self).update(entries)
    }

    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>> {
        (**self).query_names(section, filter)
    }
}
