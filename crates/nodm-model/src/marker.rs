use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{AnyReferenceable, Emitter, Referenceable};
use crate::error::{ModelError, ModelResult};

/// Stand-in for a referenceable entity inside another entity's record.
///
/// Encoded as `{"is_reference": true, "target_name": "<name>"}`. Markers
/// only ever appear inside a referring record; an entity's own stored
/// record is never wrapped in one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMarker {
    pub is_reference: bool,
    pub target_name: String,
}

impl ReferenceMarker {
    /// A marker pointing at `target_name`.
    pub fn to(target_name: impl Into<String>) -> Self {
        Self {
            is_reference: true,
            target_name: target_name.into(),
        }
    }

    /// Parse a marker, rejecting anything that is not flagged as a reference.
    pub fn from_value(value: &Value) -> ModelResult<Self> {
        let marker: Self = serde_json::from_value(value.clone())
            .map_err(|e| ModelError::parse("reference marker", e.to_string()))?;
        if !marker.is_reference {
            return Err(ModelError::parse(
                "reference marker",
                format!("{:?} is not flagged as a reference", marker.target_name),
            ));
        }
        Ok(marker)
    }

    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<ReferenceMarker> for Value {
    fn from(marker: ReferenceMarker) -> Self {
        let mut map = serde_json::Map::new();
        map.insert("is_reference".into(), Value::Bool(marker.is_reference));
        map.insert("target_name".into(), Value::String(marker.target_name));
        Value::Object(map)
    }
}

/// Encoding a shared referenceable as a marker.
pub trait ToReferenceMarker {
    /// Announce the target to `emit`, then return a marker pointing at it.
    fn to_reference_marker(&self, emit: &mut dyn Emitter) -> ModelResult<ReferenceMarker>;
}

impl<T: Referenceable> ToReferenceMarker for Arc<T> {
    fn to_reference_marker(&self, emit: &mut dyn Emitter) -> ModelResult<ReferenceMarker> {
        let erased: Arc<dyn AnyReferenceable> = self.clone();
        emit.emit(erased)?;
        Ok(ReferenceMarker::to(self.name()))
    }
}
