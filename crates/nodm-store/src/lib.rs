//! Key-value storage port for nodm.
//!
//! Every nodm backend is a flat map from `(section, name)` to a JSON
//! [`Record`]. The persistence engine in `nodm-engine` only ever talks to
//! the [`StorageBackend`] trait defined here.
//!
//! # Storage Backends
//!
//! - [`InMemoryStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileStore`] -- whole-store JSON document, reloaded on external change
//! - [`ChainStore`] -- read-through fallback over several backends
//!
//! Backends can be opened from URIs through a [`BackendRegistry`], or from a
//! TOML [`StoreConfig`].
//!
//! # Design Rules
//!
//! 1. A missing key is always [`StoreError::NotFound`], never an empty record.
//! 2. `update` is the batch commit; backends that can apply it atomically do.
//! 3. The store never interprets records beyond evaluating a [`Filter`].
//! 4. All I/O errors are propagated, never silently ignored.

pub mod chain;
pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod record;
pub mod traits;
pub mod uri;

// Re-export primary types at crate root for ergonomic imports.
pub use chain::ChainStore;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::{InMemoryStore, Sections};
pub use record::{Entry, Filter, Record};
pub use traits::StorageBackend;
pub use uri::{open_uri, BackendFactory, BackendRegistry};
