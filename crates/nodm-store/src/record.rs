//! Records, batch entries, and name filters.
//!
//! A [`Record`] is the unit a backend stores: one JSON object per
//! `(section, name)` key. Backends never look inside a record except to
//! evaluate a [`Filter`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured record: a JSON object keyed by field name.
pub type Record = serde_json::Map<String, Value>;

/// One element of a batch commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Storage namespace.
    pub section: String,
    /// Key within the section.
    pub name: String,
    /// Encoded content.
    pub record: Record,
}

impl Entry {
    /// Create a new batch entry.
    pub fn new(section: impl Into<String>, name: impl Into<String>, record: Record) -> Self {
        Self {
            section: section.into(),
            name: name.into(),
            record,
        }
    }
}

/// Equality conditions on dotted field paths.
///
/// A record matches when every path resolves, object by object, to a value
/// equal to the expected one. An empty filter matches every record.
///
/// ```
/// use nodm_store::Filter;
/// use serde_json::json;
///
/// let filter = Filter::new().eq("pichingo.tarangueta", json!("choriblingo"));
/// let record = json!({"pichingo": {"tarangueta": "choriblingo"}});
/// assert!(filter.matches(record.as_object().unwrap()));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// An empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition: the value at `path` must equal `value`.
    pub fn eq(mut self, path: impl Into<String>, value: Value) -> Self {
        self.conditions.push((path.into(), value));
        self
    }

    /// The conditions in insertion order.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against a record.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(path, expected)| lookup(record, path) == Some(expected))
    }
}

/// Walk a dotted path through nested objects.
fn lookup<'r>(record: &'r Record, path: &str) -> Option<&'r Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Apply an optional filter.
pub(crate) fn filter_matches(filter: Option<&Filter>, record: &Record) -> bool {
    filter.map_or(true, |f| f.matches(record))
}
