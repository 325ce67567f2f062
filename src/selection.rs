//! Gift selection state.
//!
//! A group is either [`Selection::Idle`] or has exactly one opened gift. The
//! active variant carries the particle id, the world position it was opened
//! at, and the memory it reveals, so those can only ever be set together.
//!
//! The selection holds a particle *id* only; transforms stay owned by the
//! [`TransitionEngine`](crate::transition::TransitionEngine), which reads
//! [`Selection::active_id`] each frame to hide the opened gift.

use crate::memory::Memory;
use crate::Vec3;
use std::sync::Arc;

/// The opened gift.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveItem {
    pub particle_id: u32,
    pub world_position: Vec3,
    pub memory: Arc<Memory>,
}

/// Outcome of a selection transition, for the caller to forward to audio.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    /// A gift opened; play its music if it has any.
    Opened { music: Option<String> },
    /// The opened gift closed; stop playback.
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    Idle,
    Active(ActiveItem),
}

impl Selection {
    pub fn is_active(&self) -> bool {
        matches!(self, Selection::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveItem> {
        match self {
            Selection::Active(item) => Some(item),
            Selection::Idle => None,
        }
    }

    pub fn active_id(&self) -> Option<u32> {
        self.active().map(|item| item.particle_id)
    }

    pub fn active_position(&self) -> Option<Vec3> {
        self.active().map(|item| item.world_position)
    }

    /// Open `particle_id` at `world_position`.
    ///
    /// No-op unless idle and the particle has a memory.
    pub fn activate(
        &mut self,
        particle_id: u32,
        world_position: Vec3,
        memory: Option<Arc<Memory>>,
    ) -> Option<SelectionEvent> {
        if self.is_active() {
            return None;
        }
        let memory = memory?;
        let music = memory.music.clone();
        *self = Selection::Active(ActiveItem {
            particle_id,
            world_position,
            memory,
        });
        Some(SelectionEvent::Opened { music })
    }

    /// Close the opened gift. No-op when idle.
    pub fn close(&mut self) -> Option<SelectionEvent> {
        match std::mem::take(self) {
            Selection::Active(_) => Some(SelectionEvent::Closed),
            Selection::Idle => None,
        }
    }
}
