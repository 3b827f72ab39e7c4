//! Flat-file storage backend.
//!
//! The whole store is one JSON document on disk:
//!
//! ```text
//! {
//!   "<section>": { "<name>": { ...record... }, ... },
//!   ...
//! }
//! ```
//!
//! Every operation first compares the file's BLAKE3 checksum with the one
//! last seen and reloads the document if another process changed it. Every
//! write rewrites the full document into a temporary file next to the
//! target and renames it into place, so a failed write never leaves a
//! truncated store behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::memory::Sections;
use crate::names::validate_key;
use crate::record::{filter_matches, Entry, Filter, Record};
use crate::traits::StorageBackend;

/// Cached document plus the checksum of the bytes it was parsed from.
#[derive(Debug, Default)]
struct FileState {
    sections: Sections,
    /// `None` when the file does not exist yet.
    checksum: Option<blake3::Hash>,
}

/// A [`StorageBackend`] persisted as a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let store = Self {
            path,
            state: Mutex::new(FileState::default()),
        };
        drop(store.lock()?);
        debug!(path = %store.path.display(), "file store opened");
        Ok(store)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A copy of the full contents, reloaded from disk if it changed.
    pub fn snapshot(&self) -> StoreResult<Sections> {
        Ok(self.lock()?.sections.clone())
    }

    /// Acquire the state lock and bring the cached document up to date.
    fn lock(&self) -> StoreResult<MutexGuard<'_, FileState>> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        self.refresh(&mut state)?;
        Ok(state)
    }

    fn refresh(&self, state: &mut FileState) -> StoreResult<()> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if state.checksum.is_some() {
                    info!(path = %self.path.display(), "store file removed; starting empty");
                }
                *state = FileState::default();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let checksum = blake3::hash(&bytes);
        if state.checksum == Some(checksum) {
            return Ok(());
        }

        state.sections = self.parse(&bytes)?;
        if state.checksum.is_some() {
            info!(path = %self.path.display(), "store file changed on disk; reloaded");
        }
        state.checksum = Some(checksum);
        Ok(())
    }

    fn parse(&self, bytes: &[u8]) -> StoreResult<Sections> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Sections::new());
        }
        serde_json::from_slice(bytes).map_err(|e| StoreError::CorruptFile {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `sections` to disk, then adopt them as the cached document.
    fn dump(&self, state: &mut FileState, sections: Sections) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&sections)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        state.sections = sections;
        state.checksum = Some(blake3::hash(&bytes));
        debug!(path = %self.path.display(), bytes = bytes.len(), "store file written");
        Ok(())
    }
}

impl StorageBackend for FileStore {
    fn get_item(&self, section: &str, name: &str) -> StoreResult<Record> {
        self.lock()?
            .sections
            .get(section)
            .and_then(|names| names.get(name))
            .cloned()
            .ok_or_else(|| StoreError::not_found(section, name))
    }

    fn set_item(&self, section: &str, name: &str, record: &Record) -> StoreResult<()> {
        self.update(&[Entry::new(section, name, record.clone())])
    }

    fn update(&self, entries: &[Entry]) -> StoreResult<()> {
        for entry in entries {
            validate_key(&entry.section, &entry.name)?;
        }
        let mut state = self.lock()?;
        let mut sections = state.sections.clone();
        for entry in entries {
            sections
                .entry(entry.section.clone())
                .or_default()
                .insert(entry.name.clone(), entry.record.clone());
        }
        self.dump(&mut state, sections)
    }

    fn query_names(&self, section: &str, filter: Option<&Filter>) -> StoreResult<Vec<String>> {
        let state = self.lock()?;
        let Some(names) = state.sections.get(section) else {
            return Ok(Vec::new());
        };
        Ok(names
            .iter()
            .filter(|(_, record)| filter_matches(filter, record))
            .map(|(name, _)| name.clone())
            .collect())
    }
}
