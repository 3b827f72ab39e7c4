//! The two serialization disciplines and the callbacks that connect them to
//! the engine.
//!
//! - [`Entity`] values are *embedded*: encoded inline in their container's
//!   record and decoded fresh every time.
//! - [`Referenceable`] values are *referenced*: stored under their own
//!   `(SECTION, name)` key and pointed to by a reference marker elsewhere.
//!
//! Both share [`Encode`]. Neither ever touches storage: encoding announces
//! referenced entities through an [`Emitter`], and decoding asks for them
//! through a [`Resolver`]. The engine supplies both and owns caching,
//! ordering, and batching.

use std::any::{Any, TypeId};
use std::sync::Arc;

use nodm_store::{Record, StoreError};

use crate::error::{ModelError, ModelResult};
use crate::marker::ReferenceMarker;

/// Conversion of a value into a [`Record`].
pub trait Encode {
    /// Encode `self`.
    ///
    /// Every referenceable entity reachable from `self` must be passed to
    /// `emit`, either directly or through nested encoders (markers and
    /// sequences do this automatically).
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record>;
}

/// A value with no identity of its own, stored inline in its container.
pub trait Entity: Encode + Sized {
    /// Rebuild the value from `record`.
    ///
    /// Must be a pure function of `record` apart from calls through
    /// `resolve`.
    fn decode(record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self>;
}

/// A named entity stored under its own `(SECTION, name)` key.
///
/// Implementors are shared as `Arc<Self>`. Two instances with the same key
/// may meet in one write only if they are the same allocation or equal by
/// value; anything else is a consistency error.
pub trait Referenceable: Encode + PartialEq + Send + Sync + Sized + 'static {
    /// Storage namespace holding every instance of this type.
    const SECTION: &'static str;

    /// Identity within [`Self::SECTION`].
    fn name(&self) -> &str;

    /// Rebuild the entity stored as `name`.
    ///
    /// The name is passed alongside the record, never inside it, and no
    /// other context is available: decoding a stored entity must not depend
    /// on which path reached it.
    fn decode(name: &str, record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self>;

    /// Prefix for generated names. Defaults to the unqualified type name.
    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Look up the entity a marker points to.
    fn from_reference_marker(
        marker: &ReferenceMarker,
        resolve: &mut dyn Resolver,
    ) -> ModelResult<Arc<Self>> {
        resolve_as::<Self>(resolve, &marker.target_name)
    }
}

/// `"Buta"` for `my_crate::domain::Buta<X>`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ---------------------------------------------------------------------------
// Emitting
// ---------------------------------------------------------------------------

/// Object-safe view of a [`Referenceable`], used by the write path to hold
/// entities of different types in one cache.
pub trait AnyReferenceable: Send + Sync {
    fn section(&self) -> &'static str;

    fn entity_name(&self) -> &str;

    /// Unqualified type name, for diagnostics.
    fn type_label(&self) -> &'static str;

    /// Same as [`Encode::encode`].
    fn encode_record(&self, emit: &mut dyn Emitter) -> ModelResult<Record>;

    fn as_any(&self) -> &dyn Any;

    /// `true` if `other` is this very instance, or a value of the same type
    /// that compares equal.
    fn same_entity(&self, other: &dyn AnyReferenceable) -> bool;
}

impl<T: Referenceable> AnyReferenceable for T {
    fn section(&self) -> &'static str {
        T::SECTION
    }

    fn entity_name(&self) -> &str {
        self.name()
    }

    fn type_label(&self) -> &'static str {
        T::type_name()
    }

    fn encode_record(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        Encode::encode(self, emit)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_entity(&self, other: &dyn AnyReferenceable) -> bool {
        let this = self as *const T as *const ();
        let that = other as *const dyn AnyReferenceable as *const ();
        std::ptr::eq(this, that) || other.as_any().downcast_ref::<T>() == Some(self)
    }
}

/// Receives every referenceable entity an encoder reaches.
pub trait Emitter {
    fn emit(&mut self, entity: Arc<dyn AnyReferenceable>) -> ModelResult<()>;
}

impl<F> Emitter for F
where
    F: FnMut(Arc<dyn AnyReferenceable>) -> ModelResult<()>,
{
    fn emit(&mut self, entity: Arc<dyn AnyReferenceable>) -> ModelResult<()> {
        self(entity)
    }
}

/// An emitter that ignores everything: encode one entity in isolation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Emitter for Discard {
    fn emit(&mut self, _: Arc<dyn AnyReferenceable>) -> ModelResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resolving
// ---------------------------------------------------------------------------

/// Type-erased decoder for one referenceable type.
pub type DecodeFn =
    fn(&str, &Record, &mut dyn Resolver) -> ModelResult<Arc<dyn Any + Send + Sync>>;

/// A request to produce the entity `(type, name)`.
#[derive(Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub section: &'static str,
    pub name: &'a str,
    /// Decodes a fetched record into the requested type.
    pub decode: DecodeFn,
}

impl<'a> ResolveRequest<'a> {
    /// Request for the `T` named `name`.
    pub fn of<T: Referenceable>(name: &'a str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            section: T::SECTION,
            name,
            decode: decode_erased::<T>,
        }
    }
}

impl std::fmt::Debug for ResolveRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveRequest")
            .field("type_name", &self.type_name)
            .field("section", &self.section)
            .field("name", &self.name)
            .finish()
    }
}

fn decode_erased<T: Referenceable>(
    name: &str,
    record: &Record,
    resolve: &mut dyn Resolver,
) -> ModelResult<Arc<dyn Any + Send + Sync>> {
    Ok(Arc::new(T::decode(name, record, resolve)?))
}

/// Produces referenced entities on behalf of decoders.
///
/// The returned value must be an `Arc<T>` for the `T` described by the
/// request; [`resolve_as`] checks this.
pub trait Resolver {
    fn resolve(&mut self, request: ResolveRequest<'_>) -> ModelResult<Arc<dyn Any + Send + Sync>>;
}

/// Resolve the `T` named `name` through `resolver`.
pub fn resolve_as<T: Referenceable>(
    resolver: &mut dyn Resolver,
    name: &str,
) -> ModelResult<Arc<T>> {
    let resolved = resolver.resolve(ResolveRequest::of::<T>(name))?;
    resolved
        .downcast::<T>()
        .map_err(|_| ModelError::TypeMismatch {
            section: T::SECTION.to_string(),
            name: name.to_string(),
            expected: T::type_name(),
        })
}

/// A resolver with nothing behind it: every lookup is `NotFound`.
///
/// Useful for decoding records that are known to hold no references.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl Resolver for Detached {
    fn resolve(&mut self, request: ResolveRequest<'_>) -> ModelResult<Arc<dyn Any + Send + Sync>> {
        Err(StoreError::not_found(request.section, request.name).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::field_as;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Buta {
        name: String,
        carontido: i64,
    }

    impl Encode for Buta {
        fn encode(&self, _: &mut dyn Emitter) -> ModelResult<Record> {
            let mut r = Record::new();
            r.insert("carontido".into(), json!(self.carontido));
            Ok(r)
        }
    }

    impl Referenceable for Buta {
        const SECTION: &'static str = "butas";

        fn name(&self) -> &str {
            &self.name
        }

        fn decode(name: &str, record: &Record, _: &mut dyn Resolver) -> ModelResult<Self> {
            Ok(Self {
                name: name.to_string(),
                carontido: field_as(record, "carontido")?,
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct Other {
        name: String,
    }

    impl Encode for Other {
        fn encode(&self, _: &mut dyn Emitter) -> ModelResult<Record> {
            Ok(Record::new())
        }
    }

    impl Referenceable for Other {
        const SECTION: &'static str = "butas";

        fn name(&self) -> &str {
            &self.name
        }

        fn decode(name: &str, _: &Record, _: &mut dyn Resolver) -> ModelResult<Self> {
            Ok(Self { name: name.into() })
        }
    }

    fn carola(carontido: i64) -> Arc<Buta> {
        Arc::new(Buta {
            name: "Carola".into(),
            carontido,
        })
    }

    /// Resolver that decodes from a fixed record and counts requests.
    struct Fixed {
        record: Record,
        calls: usize,
    }

    impl Resolver for Fixed {
        fn resolve(
            &mut self,
            request: ResolveRequest<'_>,
        ) -> ModelResult<Arc<dyn Any + Send + Sync>> {
            self.calls += 1;
            let record = self.record.clone();
            (request.decode)(request.name, &record, self)
        }
    }

    /// Resolver that hands back the wrong type.
    struct Liar;

    impl Resolver for Liar {
        fn resolve(&mut self, _: ResolveRequest<'_>) -> ModelResult<Arc<dyn Any + Send + Sync>> {
            Ok(Arc::new(42_u8))
        }
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name::<Buta>(), "Buta");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(Buta::type_name(), "Buta");
    }

    #[test]
    fn same_entity_by_identity() {
        let a = carola(27);
        let erased: Arc<dyn AnyReferenceable> = a.clone();
        assert!(a.same_entity(erased.as_ref()));
    }

    #[test]
    fn same_entity_by_value() {
        let a = carola(27);
        let b = carola(27);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(a.same_entity(b.as_ref()));
    }

    #[test]
    fn different_values_are_different_entities() {
        assert!(!carola(27).same_entity(carola(28).as_ref()));
    }

    #[test]
    fn different_types_are_different_entities() {
        let other = Other {
            name: "Carola".into(),
        };
        assert!(!carola(27).same_entity(&other));
    }

    #[test]
    fn erased_view_reports_identity() {
        let erased: Arc<dyn AnyReferenceable> = carola(27);
        assert_eq!(erased.section(), "butas");
        assert_eq!(erased.entity_name(), "Carola");
        assert_eq!(erased.type_label(), "Buta");
        assert_eq!(
            erased.encode_record(&mut Discard).unwrap()["carontido"],
            json!(27)
        );
        assert!(erased.as_any().downcast_ref::<Buta>().is_some());
    }

    #[test]
    fn closures_are_emitters() {
        let mut seen = Vec::new();
        let mut emit = |e: Arc<dyn AnyReferenceable>| -> ModelResult<()> {
            seen.push(e.entity_name().to_string());
            Ok(())
        };
        emit.emit(carola(1)).unwrap();
        assert_eq!(seen, vec!["Carola"]);
    }

    #[test]
    fn resolve_as_decodes_through_the_request() {
        let mut resolver = Fixed {
            record: json!({"carontido": 27}).as_object().cloned().unwrap(),
            calls: 0,
        };
        let buta = resolve_as::<Buta>(&mut resolver, "Carola").unwrap();
        assert_eq!(*buta, *carola(27));
        assert_eq!(resolver.calls, 1);
    }

    #[test]
    fn from_reference_marker_resolves_the_target() {
        let mut resolver = Fixed {
            record: json!({"carontido": 5}).as_object().cloned().unwrap(),
            calls: 0,
        };
        let marker = ReferenceMarker::to("Anastasia");
        let buta = Buta::from_reference_marker(&marker, &mut resolver).unwrap();
        assert_eq!(buta.name, "Anastasia");
        assert_eq!(buta.carontido, 5);
    }

    #[test]
    fn wrong_type_from_resolver_is_reported() {
        let err = resolve_as::<Buta>(&mut Liar, "Carola").unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { expected: "Buta", .. }));
    }

    #[test]
    fn detached_resolver_is_not_found() {
        let err = resolve_as::<Buta>(&mut Detached, "Carola").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn request_debug_names_the_key() {
        let debug = format!("{:?}", ResolveRequest::of::<Buta>("Carola"));
        assert!(debug.contains("butas"));
        assert!(debug.contains("Carola"));
    }
}
