use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::traits::StorageBackend;
use crate::uri::BackendRegistry;

/// Which backends to open, in lookup order.
///
/// ```toml
/// backends = ["file:///var/lib/app/store.json", "memory:"]
/// ```
///
/// One entry opens that backend directly; several are wrapped in a chain
/// (reads fall through, writes go to the first).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub backends: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backends: vec!["memory:".into()],
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::InvalidConfig(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Build the configured backend.
    pub fn open(&self, registry: &BackendRegistry) -> StoreResult<Box<dyn StorageBackend>> {
        if self.backends.is_empty() {
            return Err(StoreError::InvalidConfig(
                "`backends` must list at least one uri".into(),
            ));
        }
        registry.open_all(&self.backends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.backends, vec!["memory:"]);
        assert!(c.open(&BackendRegistry::default()).is_ok());
    }

    #[test]
    fn parse_toml() {
        let c = StoreConfig::from_toml_str(r#"backends = ["memory:", "memory:"]"#).unwrap();
        assert_eq!(c.backends.len(), 2);
        let store = c.open(&BackendRegistry::default()).unwrap();
        store.set_item("butas", "x", &Record::new()).unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            StoreConfig::from_toml_str("backends = []\nextra = 1"),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_backend_list_cannot_open() {
        let c = StoreConfig::from_toml_str("backends = []").unwrap();
        assert!(matches!(
            c.open(&BackendRegistry::default()),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodm.toml");
        std::fs::write(&path, "backends = [\"memory:\"]\n").unwrap();
        assert_eq!(StoreConfig::from_file(&path).unwrap(), StoreConfig::default());
    }
}
