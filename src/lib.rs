//! # Arix Tree
//!
//! A particle Christmas tree that morphs between a scattered sphere and a
//! cone, driven by hand gestures. Gift-box ornaments open to reveal photo and
//! music "memories" kept in a small persistent store.
//!
//! The crate is a headless simulation core: [`Scene`] advances every
//! subsystem per frame and hands the result to a [`RenderDelegate`]. The
//! `viewer` feature adds a wgpu/winit window on top.
//!
//! ## Quick Start
//!
//! ```ignore
//! use arix::prelude::*;
//!
//! let mut scene = Scene::new(SceneConfig::default(), NullPlayback)?;
//! let mut time = Time::simulated(1.0 / 60.0);
//! let mut frame = RecordingDelegate::new();
//!
//! scene.apply_gesture(&GestureFrame::new(0, GestureLabel::ClosedFist));
//! for _ in 0..300 {
//!     let (elapsed, dt) = time.update();
//!     scene.frame(dt, elapsed);
//! }
//! scene.render(&mut frame);
//! ```
//!
//! ## Core Concepts
//!
//! ### Two shapes, one progress value
//!
//! Every particle has a fixed scatter position and a fixed tree position.
//! Each group keeps a progress in `[0, 1]` that eases toward `1` while the
//! tree is formed ([`easing::approach`]); positions are interpolated with a
//! cubic ease. See [`transition`] and [`foliage`].
//!
//! ### Gestures
//!
//! A recognizer (or the keyboard, in the viewer) produces [`GestureFrame`]s.
//! [`GestureMapper`] debounces them into [`SceneAction`]s:
//!
//! | Gesture     | Action                                      |
//! |-------------|---------------------------------------------|
//! | closed fist | form the tree                               |
//! | open palm   | close the open gift, otherwise scatter      |
//! | pinch       | open the gift nearest the viewer (scattered)|
//! | hand tilt   | rotate the tree group (scattered)           |
//!
//! ### Memories
//!
//! [`MemoryStore`] persists the collection as one JSON value through a
//! [`KeyValueStore`]. Gift `id` reveals `memories[id % len]`.

pub mod audio;
pub mod camera;
pub mod cli;
pub mod config;
pub mod easing;
pub mod effects;
pub mod error;
pub mod foliage;
pub mod gesture;
pub mod input;
pub mod memory;
pub mod ornaments;
pub mod particle;
pub mod render;
pub mod scene;
pub mod selection;
pub mod shader;
pub mod spawn;
pub mod time;
pub mod transition;

#[cfg(feature = "viewer")]
pub mod gpu;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use bytemuck;
pub use glam::{Vec2, Vec3, Vec4};

pub use audio::{AudioPlayback, NullPlayback};
pub use config::SceneConfig;
pub use error::{ConfigError, InferenceError, MemoryError, StoreError};
pub use gesture::{GestureFrame, GestureLabel, GestureMapper, SceneAction};
pub use memory::{FileStore, InMemoryStore, KeyValueStore, Memory, MemoryId, MemoryStore};
pub use render::{RecordingDelegate, RenderDelegate};
pub use scene::Scene;
pub use selection::{Selection, SelectionEvent};
pub use spawn::SpawnContext;
pub use time::Time;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use arix::prelude::*;
/// ```
pub mod prelude {
    pub use crate::audio::{AudioPlayback, NullPlayback, RecordingPlayback};
    pub use crate::camera::Camera;
    pub use crate::config::SceneConfig;
    pub use crate::gesture::{GestureFrame, GestureLabel, GestureScript, SceneAction};
    pub use crate::input::{Input, KeyCode, KeyboardGestures, MouseButton};
    pub use crate::memory::{FileStore, Memory, MemoryDraft, MemoryId, MemoryStore, PendingLoads};
    pub use crate::render::{RecordingDelegate, RenderDelegate};
    pub use crate::scene::Scene;
    pub use crate::selection::SelectionEvent;
    pub use crate::spawn::SpawnContext;
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3, Vec4};
}
