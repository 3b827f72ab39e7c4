//! Typed field access for decoders.
//!
//! Each helper reports a missing or mistyped field as
//! [`ModelError::Parse`] naming the field, so decoders can stay a flat list
//! of `?` lookups.

use std::sync::Arc;

use nodm_store::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::entity::{Entity, Referenceable, Resolver};
use crate::error::{ModelError, ModelResult};
use crate::marker::ReferenceMarker;

/// The raw value of `key`.
pub fn field<'r>(record: &'r Record, key: &str) -> ModelResult<&'r Value> {
    record
        .get(key)
        .ok_or_else(|| ModelError::parse(format!("field `{key}`"), "missing"))
}

/// The value of `key`, deserialized as `T`.
pub fn field_as<T: DeserializeOwned>(record: &Record, key: &str) -> ModelResult<T> {
    serde_json::from_value(field(record, key)?.clone())
        .map_err(|e| ModelError::parse(format!("field `{key}`"), e.to_string()))
}

/// The value of `key`, which must be an object.
pub fn nested<'r>(record: &'r Record, key: &str) -> ModelResult<&'r Record> {
    field(record, key)?
        .as_object()
        .ok_or_else(|| ModelError::parse(format!("field `{key}`"), "expected an object"))
}

/// The reference marker stored in `key`.
pub fn marker(record: &Record, key: &str) -> ModelResult<ReferenceMarker> {
    ReferenceMarker::from_value(field(record, key)?).map_err(|e| match e {
        ModelError::Parse { reason, .. } => ModelError::parse(format!("field `{key}`"), reason),
        other => other,
    })
}

/// The referenced entity whose marker is stored in `key`.
pub fn reference<T: Referenceable>(
    record: &Record,
    key: &str,
    resolve: &mut dyn Resolver,
) -> ModelResult<Arc<T>> {
    T::from_reference_marker(&marker(record, key)?, resolve)
}

/// The embedded entity stored in `key`.
pub fn embedded<T: Entity>(
    record: &Record,
    key: &str,
    resolve: &mut dyn Resolver,
) -> ModelResult<T> {
    T::decode(nested(record, key)?, resolve)
}

/// Serialize a plain value for storing in a record.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> ModelResult<Value> {
    serde_json::to_value(value).map_err(|e| ModelError::parse("value", e.to_string()))
}
