//! Entity model for nodm.
//!
//! Describes how application types become JSON records and back, without
//! ever touching storage:
//!
//! - [`Entity`] for embedded values, stored inline in their container.
//! - [`Referenceable`] for named values stored under their own key and
//!   pointed to by a [`ReferenceMarker`].
//! - [`Sequence`] and [`ReferenceSequence`] for typed lists of either kind.
//!
//! The persistence engine plugs in through [`Emitter`] (write path) and
//! [`Resolver`] (read path).

pub mod entity;
pub mod error;
pub mod fields;
pub mod marker;
pub mod naming;
pub mod sequence;

pub use entity::{
    resolve_as, AnyReferenceable, DecodeFn, Detached, Discard, Emitter, Encode, Entity,
    Referenceable, ResolveRequest, Resolver,
};
pub use error::{ModelError, ModelResult};
pub use fields::{embedded, field, field_as, marker, nested, reference, to_value};
pub use marker::{ReferenceMarker, ToReferenceMarker};
pub use naming::{generate_name, name_or_generate};
pub use sequence::{ReferenceSequence, Sequence, CONTENTS_KEY};

// Storage types that appear in the model API.
pub use nodm_store::{Filter, Record};
