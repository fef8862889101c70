use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::task::Task;

/// Key under which the task collection is stored
pub const TASKS_KEY: &str = "tasks";

/// Key under which the highest ID number issued per prefix is stored
pub const SEQUENCE_KEY: &str = "sequence";

/// Error type for persistence operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a cadence workspace: no .cadence/ directory found (run `cad init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse stored tasks: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

/// Opaque key-value persistence for serialized collections
pub trait KeyValueStore {
    /// Fetch the value stored under `key`, or `None` if nothing was saved yet
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replace the value stored under `key`
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<key>.json` in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadError { path, source: e }),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes())
            .map_err(|e| StoreError::WriteError { path, source: e })
    }
}

/// In-process store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Write a file atomically: temp file in the same directory, then rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialize a task collection in storage order
pub fn serialize_tasks(tasks: &[Task]) -> Result<String, StoreError> {
    let mut out = serde_json::to_string_pretty(tasks)?;
    out.push('\n');
    Ok(out)
}

/// Parse a stored task collection
pub fn deserialize_tasks(raw: &str) -> Result<Vec<Task>, StoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Load the task collection; a store with nothing saved yields an empty list.
pub fn load_tasks(store: &dyn KeyValueStore) -> Result<Vec<Task>, StoreError> {
    match store.load(TASKS_KEY)? {
        Some(raw) => deserialize_tasks(&raw),
        None => Ok(Vec::new()),
    }
}

/// Save the full task collection
pub fn save_tasks(store: &dyn KeyValueStore, tasks: &[Task]) -> Result<(), StoreError> {
    let raw = serialize_tasks(tasks)?;
    store.save(TASKS_KEY, &raw)?;
    tracing::debug!(count = tasks.len(), "saved tasks");
    Ok(())
}

/// Load the per-prefix ID high-water marks; nothing saved yet means none issued.
pub fn load_sequence(store: &dyn KeyValueStore) -> Result<HashMap<String, usize>, StoreError> {
    match store.load(SEQUENCE_KEY)? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(HashMap::new()),
    }
}

pub fn save_sequence(
    store: &dyn KeyValueStore,
    issued: &HashMap<String, usize>,
) -> Result<(), StoreError> {
    let mut raw = serde_json::to_string_pretty(issued)?;
    raw.push('\n');
    store.save(SEQUENCE_KEY, &raw)
}
