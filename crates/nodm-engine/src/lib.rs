//! Persistence engine for nodm.
//!
//! [`Database`] turns graphs of [`Referenceable`](nodm_model::Referenceable)
//! entities into flat `(section, name) -> record` batches and back:
//!
//! - `write` / `write_with` / `write_many` walk the graph, reject identity
//!   collisions, and commit everything with one `update` call.
//! - `read` / `read_with` / `read_many` fetch and decode, sharing decoded
//!   entities through a [`ReadCache`].
//! - `query_names` forwards a [`Filter`](nodm_store::Filter) to the backend.
//!
//! ```
//! use std::sync::Arc;
//! use nodm_engine::Database;
//! use nodm_model::{field_as, Emitter, Encode, ModelResult, Record, Referenceable, Resolver};
//! use nodm_store::InMemoryStore;
//!
//! #[derive(Debug, PartialEq)]
//! struct Buta {
//!     name: String,
//!     carontido: i64,
//! }
//!
//! impl Encode for Buta {
//!     fn encode(&self, _: &mut dyn Emitter) -> ModelResult<Record> {
//!         let mut r = Record::new();
//!         r.insert("carontido".into(), self.carontido.into());
//!         Ok(r)
//!     }
//! }
//!
//! impl Referenceable for Buta {
//!     const SECTION: &'static str = "butas";
//!
//!     fn name(&self) -> &str {
//!         &self.name
//!     }
//!
//!     fn decode(name: &str, record: &Record, _: &mut dyn Resolver) -> ModelResult<Self> {
//!         Ok(Buta { name: name.into(), carontido: field_as(record, "carontido")? })
//!     }
//! }
//!
//! let db = Database::new(InMemoryStore::new());
//! db.write(&Arc::new(Buta { name: "Carola".into(), carontido: 27 })).unwrap();
//! assert_eq!(db.read::<Buta>("Carola").unwrap().carontido, 27);
//! ```

pub mod cache;
pub mod database;

#[cfg(test)]
mod fixtures;

pub use cache::{ReadCache, WriteCache};
pub use database::{Database, ReadMany};
