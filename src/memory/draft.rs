//! Add-memory form handling.
//!
//! A [`MemoryDraft`] is validated before any file is touched. The photo and
//! music files are then read on a worker thread; the frame loop polls
//! [`PendingLoads`] and applies each finished memory in one step, so a frame
//! never sees a half-loaded memory.

use super::{Memory, MemoryId};
use crate::error::MemoryError;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, warn};

/// Unsubmitted add-memory form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDraft {
    pub name: String,
    pub photo: Option<PathBuf>,
    pub music: Option<PathBuf>,
}

impl MemoryDraft {
    pub fn new(name: impl Into<String>, photo: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            photo: Some(photo.into()),
            music: None,
        }
    }

    pub fn with_music(mut self, music: impl Into<PathBuf>) -> Self {
        self.music = Some(music.into());
        self
    }

    /// Check required fields. Runs before any file read.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.name.trim().is_empty() {
            return Err(MemoryError::MissingName);
        }
        if self.photo.is_none() {
            return Err(MemoryError::MissingPhoto);
        }
        Ok(())
    }

    /// Validate, read both files and build the memory. Blocking.
    pub fn load(&self, id: MemoryId) -> Result<Memory, MemoryError> {
        self.validate()?;
        let photo_path = self.photo.as_deref().ok_or(MemoryError::MissingPhoto)?;
        let photo = read_data_uri(photo_path)?;
        let music = self.music.as_deref().map(read_data_uri).transpose()?;
        Ok(Memory {
            id,
            name: self.name.trim().to_string(),
            photo,
            music,
        })
    }
}

fn read_data_uri(path: &Path) -> Result<String, MemoryError> {
    let bytes = std::fs::read(path).map_err(|source| MemoryError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(data_uri_from_bytes(mime_for_path(path), &bytes))
}

/// `data:<mime>;base64,<payload>`
pub fn data_uri_from_bytes(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// MIME type guessed from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Memories being read in the background.
#[derive(Debug, Default)]
pub struct PendingLoads {
    in_flight: Vec<Receiver<Result<Memory, MemoryError>>>,
}

impl PendingLoads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `draft` and start reading its files on a worker thread.
    ///
    /// Validation errors are returned immediately and nothing is spawned.
    pub fn submit(&mut self, draft: MemoryDraft, id: MemoryId) -> Result<(), MemoryError> {
        draft.validate()?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(draft.load(id));
        });
        self.in_flight.push(rx);
        debug!(pending = self.in_flight.len(), "Memory load submitted");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Collect finished loads without blocking.
    pub fn poll(&mut self) -> Vec<Result<Memory, MemoryError>> {
        let mut done = Vec::new();
        self.in_flight.retain(|rx| match rx.try_recv() {
            Ok(result) => {
                done.push(result);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                warn!("Memory load worker exited without a result");
                done.push(Err(MemoryError::Cancelled));
                false
            }
        });
        done
    }

    /// Block until every in-flight load finishes.
    pub fn wait_all(&mut self) -> Vec<Result<Memory, MemoryError>> {
        self.in_flight
            .drain(..)
            .map(|rx| rx.recv().unwrap_or(Err(MemoryError::Cancelled)))
            .collect()
    }
}
