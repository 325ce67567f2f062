//! Error types for Arix.
//!
//! Persistence, memory management, configuration, gesture inference and
//! (with the `viewer` feature) GPU setup each get their own error enum.

use crate::memory::MemoryId;
use std::path::PathBuf;

/// Errors from the key-value persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The value does not fit in the backend's quota.
    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    Quota { needed: usize, limit: usize },
    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from memory collection operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The add form had no name.
    #[error("a memory needs a name")]
    MissingName,
    /// The add form had no photo.
    #[error("a memory needs a photo")]
    MissingPhoto,
    /// The collection already holds a memory with this id.
    #[error("a memory with id {0} already exists")]
    DuplicateId(MemoryId),
    /// Reading a photo or music file failed.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An import was not a JSON array of memories.
    #[error("invalid import: {0}")]
    InvalidImport(String),
    /// Serializing the collection failed.
    #[error("failed to serialize memories: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The background file read was dropped before finishing.
    #[error("file read was cancelled")]
    Cancelled,
}

/// Errors from loading or validating a [`SceneConfig`](crate::config::SceneConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure reported by the gesture inference collaborator for one frame.
#[derive(Debug, Clone, thiserror::Error)]
#[error("gesture inference failed: {0}")]
pub struct InferenceError(pub String);

/// Errors that can occur during GPU initialization.
#[cfg(feature = "viewer")]
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,
}

/// Errors that can occur when running the viewer.
#[cfg(feature = "viewer")]
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
