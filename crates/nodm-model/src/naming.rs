use uuid::Uuid;

use crate::entity::Referenceable;

/// A fresh name for a `T`: `"<type name>-<uuid>"`.
///
/// Uses time-ordered v7 UUIDs, so names generated in one process sort by
/// creation time. Uniqueness is probabilistic; the engine does not check
/// generated names against storage.
pub fn generate_name<T: Referenceable>() -> String {
    format!("{}-{}", T::type_name(), Uuid::now_v7())
}

/// `name` if given, otherwise a generated one.
pub fn name_or_generate<T: Referenceable>(name: Option<impl Into<String>>) -> String {
    match name {
        Some(name) => name.into(),
        None => generate_name::<T>(),
    }
}
