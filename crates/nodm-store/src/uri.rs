//! Backend selection by URI.
//!
//! A [`BackendRegistry`] maps URI schemes to constructors. The default
//! registry understands:
//!
//! - `memory:`: a fresh [`InMemoryStore`]
//! - `file:///abs/store.json`: a [`FileStore`] at an absolute local path
//! - `chain:?backend=<uri>&backend=<uri>`: a [`ChainStore`] over the
//!   percent-decoded sub-URIs, in order

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;
use url::Url;

use crate::chain::ChainStore;
use crate::error::{StoreError, StoreResult};
use crate::file::FileStore;
use crate::memory::InMemoryStore;
use crate::traits::StorageBackend;

/// Builds a backend from a parsed URI. The registry is passed along so that
/// composite schemes can open their children.
pub type BackendFactory =
    fn(&Url, &BackendRegistry) -> StoreResult<Box<dyn StorageBackend>>;

/// Scheme → constructor table.
#[derive(Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// A registry with no schemes.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `scheme`.
    pub fn register(&mut self, scheme: impl Into<String>, factory: BackendFactory) -> &mut Self {
        self.factories.insert(scheme.into(), factory);
        self
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Open the backend named by `uri`.
    pub fn open(&self, uri: &str) -> StoreResult<Box<dyn StorageBackend>> {
        let parsed = Url::parse(uri).map_err(|e| invalid(uri, e.to_string()))?;
        let factory = self
            .factories
            .get(parsed.scheme())
            .ok_or_else(|| invalid(uri, format!("unknown scheme {:?}", parsed.scheme())))?;
        debug!(uri, "opening backend");
        factory(&parsed, self)
    }

    /// Open several backends; more than one is wrapped in a [`ChainStore`].
    pub fn open_all<S: AsRef<str>>(&self, uris: &[S]) -> StoreResult<Box<dyn StorageBackend>> {
        match uris {
            [] => Err(StoreError::InvalidConfig("no backend uri given".into())),
            [single] => self.open(single.as_ref()),
            many => {
                let backends = many
                    .iter()
                    .map(|u| self.open(u.as_ref()))
                    .collect::<StoreResult<Vec<_>>>()?;
                Ok(Box::new(ChainStore::new(backends)?))
            }
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("memory", open_memory)
            .register("file", open_file)
            .register("chain", open_chain);
        registry
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

/// Open `uri` with the default registry.
pub fn open_uri(uri: &str) -> StoreResult<Box<dyn StorageBackend>> {
    BackendRegistry::default().open(uri)
}

fn invalid(uri: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidUri {
        uri: uri.to_string(),
        reason: reason.into(),
    }
}

fn open_memory(_: &Url, _: &BackendRegistry) -> StoreResult<Box<dyn StorageBackend>> {
    Ok(Box::new(InMemoryStore::new()))
}

fn open_file(url: &Url, _: &BackendRegistry) -> StoreResult<Box<dyn StorageBackend>> {
    let path: PathBuf = url
        .to_file_path()
        .map_err(|()| invalid(url.as_str(), "not a local file path"))?;
    if path.file_name().is_none() {
        return Err(invalid(url.as_str(), "missing file name"));
    }
    Ok(Box::new(FileStore::open(path)?))
}

fn open_chain(url: &Url, registry: &BackendRegistry) -> StoreResult<Box<dyn StorageBackend>> {
    let children: Vec<String> = url
        .query_pairs()
        .filter(|(key, _)| key == "backend")
        .map(|(_, value)| value.into_owned())
        .collect();
    if children.is_empty() {
        return Err(invalid(url.as_str(), "chain needs at least one backend= parameter"));
    }
    let backends = children
        .iter()
        .map(|child| registry.open(child))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Box::new(ChainStore::new(backends)?))
}
