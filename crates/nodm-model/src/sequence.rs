//! Typed sequences of entities.
//!
//! Both sequence kinds encode as a record with a single `contents` list:
//!
//! - [`Sequence<T>`] stores each element's full record inline.
//! - [`ReferenceSequence<T>`] stores one reference marker per element and
//!   emits every element so the engine persists it under its own key.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use nodm_store::Record;
use serde_json::Value;

use crate::entity::{Emitter, Encode, Entity, Referenceable, Resolver};
use crate::error::{ModelError, ModelResult};
use crate::fields::field;
use crate::marker::{ReferenceMarker, ToReferenceMarker};

/// Field holding the element list.
pub const CONTENTS_KEY: &str = "contents";

fn contents(record: &Record) -> ModelResult<&Vec<Value>> {
    field(record, CONTENTS_KEY)?
        .as_array()
        .ok_or_else(|| ModelError::parse(format!("field `{CONTENTS_KEY}`"), "expected a list"))
}

fn wrap(items: Vec<Value>) -> Record {
    let mut record = Record::new();
    record.insert(CONTENTS_KEY.to_string(), Value::Array(items));
    record
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// An ordered list of embedded entities.
///
/// Decoding builds fresh elements every time; there is no sharing between
/// two decodes of the same record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence<T>(Vec<T>);

impl<T> Sequence<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Encode> Encode for Sequence<T> {
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        let items = self
            .0
            .iter()
            .map(|element| element.encode(emit).map(Value::Object))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(wrap(items))
    }
}

impl<T: Entity> Entity for Sequence<T> {
    fn decode(record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self> {
        contents(record)?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let item = item.as_object().ok_or_else(|| {
                    ModelError::parse(format!("{CONTENTS_KEY}[{index}]"), "expected an object")
                })?;
                T::decode(item, resolve)
            })
            .collect::<ModelResult<Vec<_>>>()
            .map(Self)
    }
}

// ---------------------------------------------------------------------------
// ReferenceSequence
// ---------------------------------------------------------------------------

/// An ordered list of shared referenceable entities, encoded as markers.
#[derive(Debug, PartialEq, Eq)]
pub struct ReferenceSequence<T>(Vec<Arc<T>>);

impl<T> ReferenceSequence<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_inner(self) -> Vec<Arc<T>> {
        self.0
    }
}

impl<T> Default for ReferenceSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: cloning shares the elements and needs no `T: Clone`.
impl<T> Clone for ReferenceSequence<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Referenceable> Encode for ReferenceSequence<T> {
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        let items = self
            .0
            .iter()
            .map(|element| element.to_reference_marker(emit).map(Value::from))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(wrap(items))
    }
}

impl<T: Referenceable> Entity for ReferenceSequence<T> {
    fn decode(record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self> {
        contents(record)?
            .iter()
            .map(|item| T::from_reference_marker(&ReferenceMarker::from_value(item)?, resolve))
            .collect::<ModelResult<Vec<_>>>()
            .map(Self)
    }
}

// ---------------------------------------------------------------------------
// Collection plumbing shared by both kinds
// ---------------------------------------------------------------------------

macro_rules! vec_wrapper {
    ($wrapper:ident, $element:ty) => {
        impl<T> Deref for $wrapper<T> {
            type Target = Vec<$element>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl<T> DerefMut for $wrapper<T> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl<T> From<Vec<$element>> for $wrapper<T> {
            fn from(items: Vec<$element>) -> Self {
                Self(items)
            }
        }

        impl<T> FromIterator<$element> for $wrapper<T> {
            fn from_iter<I: IntoIterator<Item = $element>>(iter: I) -> Self {
                Self(iter.into_iter().collect())
            }
        }

        impl<T> IntoIterator for $wrapper<T> {
            type Item = $element;
            type IntoIter = std::vec::IntoIter<$element>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl<'a, T> IntoIterator for &'a $wrapper<T> {
            type Item = &'a $element;
            type IntoIter = std::slice::Iter<'a, $element>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    };
}

vec_wrapper!(Sequence, T);
vec_wrapper!(ReferenceSequence, Arc<T>);
