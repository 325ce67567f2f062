//! Memory collection and its persistence backends.

use super::{parse_collection, serialize_collection, Memory, MemoryId, PendingLoads};
use crate::error::{MemoryError, StoreError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// External blob store keyed by a namespace string.
pub trait KeyValueStore {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replace the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store, optionally limited to `quota` bytes per value.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_quota(self.quota, value)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_quota(self.quota, value)?;
        fs::create_dir_all(&self.dir)?;
        // Write then rename so a crash never leaves a half-written collection.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn check_quota(quota: Option<usize>, value: &str) -> Result<(), StoreError> {
    match quota {
        Some(limit) if value.len() > limit => Err(StoreError::Quota {
            needed: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Result of writing the collection through after a mutation.
///
/// A failed write never rolls the in-memory collection back.
#[derive(Debug)]
#[must_use]
pub enum Persisted {
    /// The full collection was written.
    Saved,
    /// Nothing changed, nothing was written.
    Unchanged,
    /// The mutation applied in memory but the write failed.
    Failed(StoreError),
}

impl Persisted {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persisted::Saved)
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Persisted::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Ordered memory collection (newest first), written through to a
/// [`KeyValueStore`] on every mutation.
#[derive(Debug)]
pub struct MemoryStore<S: KeyValueStore> {
    memories: Vec<Memory>,
    backend: S,
    key: String,
    revision: u64,
}

impl<S: KeyValueStore> MemoryStore<S> {
    /// Load the collection stored under `key`.
    ///
    /// A missing, unreadable or corrupt value starts an empty collection.
    pub fn open(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let memories = match backend.get(&key) {
            Ok(Some(json)) => match parse_collection(&json) {
                Ok(memories) => memories,
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored memories are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored memories, starting empty");
                Vec::new()
            }
        };
        info!(count = memories.len(), "Memories loaded");
        Self {
            memories,
            backend,
            key,
            revision: 0,
        }
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn get(&self, id: &MemoryId) -> Option<&Memory> {
        self.memories.iter().find(|m| m.id == *id)
    }

    /// Bumped on every in-memory change; lets the scene rebind cheaply.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Insert a memory at the front. Name and photo are required.
    pub fn add(&mut self, memory: Memory) -> Result<Persisted, MemoryError> {
        if memory.name.trim().is_empty() {
            return Err(MemoryError::MissingName);
        }
        if memory.photo.is_empty() {
            return Err(MemoryError::MissingPhoto);
        }
        if self.get(&memory.id).is_some() {
            return Err(MemoryError::DuplicateId(memory.id));
        }
        info!(id = %memory.id, name = %memory.name, "Memory added");
        self.memories.insert(0, memory);
        Ok(self.commit())
    }

    /// Remove the memory with `id`. Absent ids are a no-op.
    pub fn delete(&mut self, id: &MemoryId) -> Persisted {
        let before = self.memories.len();
        self.memories.retain(|m| m.id != *id);
        if self.memories.len() == before {
            return Persisted::Unchanged;
        }
        info!(id = %id, "Memory deleted");
        self.commit()
    }

    /// Add every memory whose background load has finished.
    ///
    /// Each memory lands whole in a single call, so a frame sees either the
    /// old collection or one that includes the complete new memory.
    pub fn apply_pending(&mut self, pending: &mut PendingLoads) -> Vec<Result<Persisted, MemoryError>> {
        pending
            .poll()
            .into_iter()
            .map(|loaded| match loaded {
                Ok(memory) => self.add(memory),
                Err(e) => {
                    warn!(error = %e, "Memory load failed");
                    Err(e)
                }
            })
            .collect()
    }

    /// Replace the whole collection with the contents of an import file.
    ///
    /// Confirmation is the caller's job. Rejected input leaves the collection
    /// untouched.
    pub fn import_json(&mut self, json: &str) -> Result<Persisted, MemoryError> {
        let memories = parse_collection(json).inspect_err(|e| {
            warn!(error = %e, "Import rejected");
        })?;
        Ok(self.replace_all(memories))
    }

    /// Replace the whole collection.
    pub fn replace_all(&mut self, memories: Vec<Memory>) -> Persisted {
        info!(count = memories.len(), "Memories imported");
        self.memories = memories;
        self.commit()
    }

    /// Serialize the collection in the import/export format.
    pub fn export_json(&self) -> Result<String, MemoryError> {
        let json = serialize_collection(&self.memories)?;
        info!(count = self.memories.len(), "Memories exported");
        Ok(json)
    }

    fn commit(&mut self) -> Persisted {
        self.revision += 1;
        let json = match serde_json::to_string(&self.memories) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize memories for storage");
                return Persisted::Failed(StoreError::Io(std::io::Error::other(e)));
            }
        };
        match self.backend.set(&self.key, &json) {
            Ok(()) => Persisted::Saved,
            Err(e) => {
                warn!(error = %e, "Failed to persist memories, keeping them for this session");
                Persisted::Failed(e)
            }
        }
    }
}
