//! File-backed persistence for notes and categories.
//!
//! Each collection lives in its own pretty-printed JSON array. There is no
//! cache: every load reads the whole document from disk and every write
//! replaces the whole document. Writes go through a temporary file in the
//! same directory followed by a rename, so a reader sees either the previous
//! or the new document and never a partially written one.
use std::{
    fs,
    io::{self, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{debug, error, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::{default_categories, BoxedSource, Category, Config, IdeaflowError, Note, Result};

/// One JSON array document on disk holding every record of type `T`.
#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Opens the document at `path`, creating it (and its directory) with
    /// `initial` as content when it does not exist yet. An existing file is
    /// never touched.
    pub fn open(path: PathBuf, initial: &[T]) -> Result<Self> {
        let document = Self {
            path,
            _records: PhantomData,
        };
        document.ensure_exists(initial)?;
        Ok(document)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_exists(&self, initial: &[T]) -> Result<()> {
        let unavailable = |source: io::Error| {
            error!("Store {} unavailable: {}", self.path.display(), source);
            IdeaflowError::StoreUnavailable {
                path: self.path.clone(),
                source,
            }
        };

        let dir = self.parent_dir();
        if !dir.exists() {
            debug!("Data directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(dir).map_err(unavailable)?;
        }

        if self.path.exists() {
            trace!("Store {} already initialized", self.path.display());
            return Ok(());
        }

        info!("Initializing store {}", self.path.display());
        let temp_file = self.write_temp(initial).map_err(|e| match e {
            IdeaflowError::StoreWrite { source, .. } => {
                unavailable(io::Error::new(io::ErrorKind::Other, source))
            }
            other => other,
        })?;

        // Never clobber a document another process created in the meantime
        match temp_file.persist_noclobber(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Store {} created concurrently, keeping it", self.path.display());
                Ok(())
            }
            Err(e) => Err(unavailable(e.error)),
        }
    }

    /// Reads every record, in storage order.
    pub fn load(&self) -> Result<Vec<T>> {
        trace!("Loading store {}", self.path.display());
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read store {}: {}", self.path.display(), e);
            IdeaflowError::StoreRead {
                path: self.path.clone(),
                source: e.into(),
            }
        })?;

        serde_json::from_str(&content).map_err(|e| {
            error!("Store {} holds malformed JSON: {}", self.path.display(), e);
            IdeaflowError::StoreRead {
                path: self.path.clone(),
                source: e.into(),
            }
        })
    }

    /// Replaces the document with `records`.
    pub fn persist(&self, records: &[T]) -> Result<()> {
        let temp_file = self.write_temp(records)?;

        debug!("Performing atomic move of temporary file to {}", self.path.display());
        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            self.write_error(e.error)
        })?;

        trace!("Persisted {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn write_temp(&self, records: &[T]) -> Result<NamedTempFile> {
        let mut temp_file = NamedTempFile::new_in(self.parent_dir()).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            self.write_error(e)
        })?;

        let json = serde_json::to_string_pretty(records).map_err(|e| {
            error!("Failed to serialize {}: {}", self.path.display(), e);
            self.write_error(e)
        })?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            self.write_error(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            self.write_error(e)
        })?;

        Ok(temp_file)
    }

    fn write_error(&self, e: impl Into<BoxedSource>) -> IdeaflowError {
        IdeaflowError::StoreWrite {
            path: self.path.clone(),
            source: e.into(),
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

/// The two collections behind the application: notes and categories.
///
/// Mutations run load-modify-persist under one writer lock, so two writers
/// in this process cannot lose each other's changes. Nothing coordinates
/// separate processes sharing a data directory; between them the last
/// whole-document write wins.
#[derive(Debug)]
pub struct NoteStore {
    notes: JsonDocument<Note>,
    categories: JsonDocument<Category>,
    write_lock: Mutex<()>,
}

impl NoteStore {
    /// Opens the store described by `config`, creating the data directory and
    /// default documents (no notes, the seed categories) on first use.
    pub fn open(config: &Config) -> Result<Self> {
        info!(
            "Opening note store: notes={}, categories={}",
            config.notes_path().display(),
            config.categories_path().display()
        );

        let notes = JsonDocument::open(config.notes_path(), &[])?;
        let categories = JsonDocument::open(config.categories_path(), &default_categories())?;

        Ok(Self {
            notes,
            categories,
            write_lock: Mutex::new(()),
        })
    }

    pub fn notes_path(&self) -> &Path {
        self.notes.path()
    }

    pub fn categories_path(&self) -> &Path {
        self.categories.path()
    }

    /// Every note as currently persisted.
    pub fn load_notes(&self) -> Result<Vec<Note>> {
        self.notes.load()
    }

    /// Every category as currently persisted.
    pub fn load_categories(&self) -> Result<Vec<Category>> {
        self.categories.load()
    }

    /// Loads the notes, applies `change` and persists the result, all while
    /// holding the writer lock. The closure's return value is passed through.
    pub fn update_notes<F, R>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Note>) -> R,
    {
        // The guarded data is (), so a poisoned lock carries no broken state
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut notes = self.notes.load()?;
        let outcome = change(&mut notes);

        if has_duplicate_ids(&notes) {
            warn!(
                "Notes document {} contains duplicate ids",
                self.notes.path().display()
            );
        }

        self.notes.persist(&notes)?;
        Ok(outcome)
    }
}

fn has_duplicate_ids(notes: &[Note]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(notes.len());
    notes.iter().any(|note| !seen.insert(note.id.as_str()))
}
