//! Error types shared by the entity model and the persistence engine.
//!
//! Encoding and decoding call back into the engine through [`Emitter`] and
//! [`Resolver`], so one error type has to carry both model failures and
//! storage failures through those callbacks.
//!
//! [`Emitter`]: crate::Emitter
//! [`Resolver`]: crate::Resolver

use nodm_store::StoreError;
use thiserror::Error;

/// Errors from encoding, decoding, and persisting entity graphs.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two different entities claimed the same identity in one write.
    #[error("different objects share the identity {section}/{name}")]
    Consistency { section: String, name: String },

    /// A stored record does not have the shape the entity expects.
    #[error("cannot parse {context}: {reason}")]
    Parse { context: String, reason: String },

    /// A resolver returned an entity of the wrong concrete type.
    #[error("resolved {section}/{name} is not a {expected}")]
    TypeMismatch {
        section: String,
        name: String,
        expected: &'static str,
    },

    /// Failure reported by the storage backend, including `NotFound`.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModelError {
    /// Shorthand for [`ModelError::Parse`].
    pub fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if a requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// Returns `true` for identity collisions detected during a write.
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency { .. })
    }
}

/// Result alias for model and engine operations.
pub type ModelResult<T> = Result<T, ModelError>;
