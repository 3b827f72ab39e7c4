//! Small entity domain shared by the engine tests.
//!
//! `Pichileta` refers to a `Tafirosis` and a list of `Buta`s, embeds a
//! `Pichingo`, and `Tafirosis` refers to one more `Buta`. A `Rack` holds
//! embedded `Slot`s, each of which refers to a `Buta`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nodm_model::{
    embedded, field_as, name_or_generate, reference, to_value, Emitter, Encode, Entity,
    ModelResult, Record, ReferenceSequence, Referenceable, Resolver, Sequence, ToReferenceMarker,
};
use nodm_store::{Entry, Filter, InMemoryStore, StorageBackend, StoreResult};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub struct Buta {
    pub name: String,
    pub carontido: i64,
}

impl Buta {
    pub fn new(name: Option<&str>, carontido: i64) -> Arc<Self> {
        Arc::new(Self {
            name: name_or_generate::<Self>(name),
            carontido,
        })
    }
}

impl Encode for Buta {
    fn encode(&self, _: &mut dyn Emitter) -> ModelResult<Record> {
        let mut r = Record::new();
        r.insert("carontido".into(), to_value(&self.carontido)?);
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
pub struct Tafirosis {
    pub name: String,
    pub cajeta_de_amarula: String,
    pub buta: Arc<Buta>,
}

impl Tafirosis {
    pub fn new(name: Option<&str>, cajeta_de_amarula: &str, buta: Arc<Buta>) -> Arc<Self> {
        Arc::new(Self {
            name: name_or_generate::<Self>(name),
            cajeta_de_amarula: cajeta_de_amarula.to_string(),
            buta,
        })
    }
}

impl Encode for Tafirosis {
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        let mut r = Record::new();
        r.insert("cajeta_de_amarula".into(), to_value(&self.cajeta_de_amarula)?);
        r.insert("buta".into(), self.buta.to_reference_marker(emit)?.into());
        Ok(r)
    }
}

impl Referenceable for Tafirosis {
    const SECTION: &'static str = "tafirosisis";

    fn name(&self) -> &str {
        &self.name
    }

    fn decode(name: &str, record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self> {
        Ok(Self {
            name: name.to_string(),
            cajeta_de_amarula: field_as(record, "cajeta_de_amarula")?,
            buta: reference(record, "buta", resolve)?,
        })
    }
}

/// Embedded, no identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Pichingo {
    pub tarangueta: String,
}

impl Default for Pichingo {
    fn default() -> Self {
        Self {
            tarangueta: "choriblingo".into(),
        }
    }
}

impl Encode for Pichingo {
    fn encode(&self, _: &mut dyn Emitter) -> ModelResult<Record> {
        let mut r = Record::new();
        r.insert("tarangueta".into(), to_value(&self.tarangueta)?);
        Ok(r)
    }
}

impl Entity for Pichingo {
    fn decode(record: &Record, _: &mut dyn Resolver) -> ModelResult<Self> {
        Ok(Self {
            tarangueta: field_as(record, "tarangueta")?,
        })
    }
}

#[derive(Debug, PartialEq)]
pub struct Pichileta {
    pub name: String,
    pub sucutrule: u32,
    pub pichingo: Pichingo,
    pub tafirosis: Arc<Tafirosis>,
    pub butas: ReferenceSequence<Buta>,
}

impl Pichileta {
    pub fn new(
        name: Option<&str>,
        sucutrule: u32,
        tafirosis: Arc<Tafirosis>,
        butas: Vec<Arc<Buta>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name_or_generate::<Self>(name),
            sucutrule,
            pichingo: Pichingo::default(),
            tafirosis,
            butas: butas.into(),
        })
    }
}

impl Encode for Pichileta {
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        let mut r = Record::new();
        r.insert("sucutrule".into(), to_value(&self.sucutrule)?);
        r.insert("pichingo".into(), Value::Object(self.pichingo.encode(emit)?));
        r.insert("tafirosis".into(), self.tafirosis.to_reference_marker(emit)?.into());
        r.insert("butas".into(), Value::Object(self.butas.encode(emit)?));
        Ok(r)
    }
}

impl Referenceable for Pichileta {
    const SECTION: &'static str = "pichiletas";

    fn name(&self) -> &str {
        &self.name
    }

    fn decode(name: &str, record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self> {
        Ok(Self {
            name: name.to_string(),
            sucutrule: field_as(record, "sucutrule")?,
            pichingo: embedded(record, "pichingo", resolve)?,
            tafirosis: reference(record, "tafirosis", resolve)?,
            butas: embedded(record, "butas", resolve)?,
        })
    }
}

/// The graph from the round-trip scenario: "Diego Nul" with two butas and a
/// tafirosis that refers to an auto-named one.
pub fn diego_nul() -> Arc<Pichileta> {
    let generica = Buta::new(Some("Buta Generica"), 23);
    let tafirosis = Tafirosis::new(None, "caipiroska", generica);
    Pichileta::new(
        Some("Diego Nul"),
        9001,
        tafirosis,
        vec![Buta::new(Some("Anastasia"), 18), Buta::new(Some("Carola"), 27)],
    )
}

/// Embedded, refers to a `Buta`.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub buta: Arc<Buta>,
}

impl Encode for Slot {
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        let mut r = Record::new();
        r.insert("buta".into(), self.buta.to_reference_marker(emit)?.into());
        Ok(r)
    }
}

impl Entity for Slot {
    fn decode(record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self> {
        Ok(Self {
            buta: reference(record, "buta", resolve)?,
        })
    }
}

#[derive(Debug, PartialEq)]
pub struct Rack {
    pub name: String,
    pub slots: Sequence<Slot>,
}

impl Rack {
    pub fn new(name: &str, butas: Vec<Arc<Buta>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            slots: butas.into_iter().map(|buta| Slot { buta }).collect(),
        })
    }
}

impl Encode for Rack {
    fn encode(&self, emit: &mut dyn Emitter) -> ModelResult<Record> {
        let mut r = Record::new();
        r.insert("slots".into(), Value::Object(self.slots.encode(emit)?));
        Ok(r)
    }
}

impl Referenceable for Rack {
    const SECTION: &'static str = "racks";

    fn name(&self) -> &str {
        &self.name
    }

    fn decode(name: &str, record: &Record, resolve: &mut dyn Resolver) -> ModelResult<Self> {
        Ok(Self {
            name: name.to_string(),
            slots: embedded(record, "slots", resolve)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Recording backend
// ---------------------------------------------------------------------------

/// In-memory backend that records every `update` batch.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: InMemoryStore,
    updates: AtomicUsize,
    batches: Mutex<Vec<Vec<(String, String)>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Keys of each committed batch, in commit order.
    pub fn batches(&self) -> Vec<Vec<(String, String)>> {
        self.batches.lock().expect("batches lock").clone()
    }
}

impl StorageBackend for RecordingStore {
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record> {
        self.inner.get_item(section, name)
    }

    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()> {
        self.inner.set_item(section, name, record)
    }

    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().expect("batches lock").push(
            entries
                .iter()
                .map(|e| (e.section.clone(), e.name.clone()))
                .collect(),
        );
        self.inner.update(entries)
    }

    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>> {
        self.inner.query_names(section, filter)
    }
}
