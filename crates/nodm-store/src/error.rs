//! Error types for storage operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record is stored under `(section, name)`.
    #[error("not found: {section}/{name}")]
    NotFound { section: String, name: String },

    /// The section name cannot be used as a storage namespace.
    #[error("invalid section name: {section:?}: {reason}")]
    InvalidSection { section: String, reason: String },

    /// The entity name cannot be used as a key.
    #[error("invalid entity name in section {section}: {reason}")]
    InvalidName { section: String, reason: String },

    /// A backend URI could not be parsed or names an unknown scheme.
    #[error("invalid backend uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The store configuration is unusable.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// The on-disk document is not a `{section: {name: record}}` map.
    #[error("corrupt store file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding backend state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    pub fn not_found(section: &str, name: &str) -> Self {
        Self::NotFound {
            section: section.to_string(),
            name: name.to_string(),
        }
    }

    /// Returns `true` if this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
