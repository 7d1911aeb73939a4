//! Persistence adapters: where a [`Document`] is loaded from and saved to.
//!
//! The table store only ever reads or writes a whole document, so an adapter
//! needs three operations and no knowledge of tables.

use crate::document::Document;
use crate::error::{JsonTableError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const EXTENSION: &str = "json";

/// Loads and saves an entire document.
pub trait PersistenceAdapter {
    /// Whether the backing resource exists yet.
    fn exists(&self) -> bool;

    /// Load the full document. Fails if the resource is missing or malformed.
    fn load(&self) -> Result<Document>;

    /// Replace the stored document with `document`.
    fn save(&self, document: &Document) -> Result<()>;
}

/// A JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
    pretty: bool,
}

impl FileAdapter {
    /// Resolve a database path. A missing extension gets `.json` appended;
    /// any extension other than `.json` is rejected.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "Database path cannot be empty".into(),
            ));
        }

        let path = match path.extension().and_then(|e| e.to_str()) {
            Some(EXTENSION) => path.to_path_buf(),
            Some(other) => {
                return Err(JsonTableError::InvalidArgument(format!(
                    "The extension '.{other}' is invalid, give the database name without extension or with '.{EXTENSION}'"
                )));
            }
            None => {
                let mut with_ext = path.as_os_str().to_owned();
                with_ext.push(".");
                with_ext.push(EXTENSION);
                PathBuf::from(with_ext)
            }
        };

        Ok(FileAdapter { path, pretty: true })
    }

    /// Write single-line JSON instead of pretty-printed output.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Full path, extension included.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name with extension, e.g. `db.json`.
    pub fn full_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension, e.g. `db`.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl PersistenceAdapter for FileAdapter {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Document> {
        if !self.exists() {
            return Err(JsonTableError::Runtime(format!(
                "Database '{}' does not exist",
                self.path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let document = serde_json::from_str(&content).map_err(|e| {
            JsonTableError::Runtime(format!(
                "Database '{}' is not a valid table document: {e}",
                self.path.display()
            ))
        })?;

        log::debug!("Loaded {}", self.path.display());
        Ok(document)
    }

    fn save(&self, document: &Document) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Write beside the target, then rename over it
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        if self.pretty {
            serde_json::to_writer_pretty(&mut tmp, document)?;
        } else {
            serde_json::to_writer(&mut tmp, document)?;
        }
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| JsonTableError::Io(e.error))?;

        log::debug!("Saved {} ({} tables)", self.path.display(), document.len());
        Ok(())
    }
}

/// An in-process document, for tests and scratch databases.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    slot: Mutex<Option<Document>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_document(document: Document) -> Self {
        MemoryAdapter {
            slot: Mutex::new(Some(document)),
        }
    }

    fn slot(&self) -> Result<MutexGuard<'_, Option<Document>>> {
        self.slot
            .lock()
            .map_err(|_| JsonTableError::Runtime("In-memory document lock poisoned".into()))
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn exists(&self) -> bool {
        self.slot().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn load(&self) -> Result<Document> {
        self.slot()?
            .clone()
            .ok_or_else(|| JsonTableError::Runtime("In-memory database does not exist".into()))
    }

    fn save(&self, document: &Document) -> Result<()> {
        *self.slot()? = Some(document.clone());
        Ok(())
    }
}
