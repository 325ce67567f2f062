//! Background music for opened gifts.
//!
//! The scene only talks to an [`AudioPlayback`] implementation: `play` when a
//! gift with music opens, `stop` when it closes. Playback loops at a fixed
//! volume.

use tracing::debug;

/// Fixed playback volume.
pub const VOLUME: f32 = 0.5;

/// Audio output collaborator.
pub trait AudioPlayback {
    /// Start looping `url` at [`VOLUME`], replacing anything playing.
    fn play(&mut self, url: &str);
    /// Stop playback and rewind.
    fn stop(&mut self);
}

/// Forward an opened gift's music (or its absence) to `audio`.
pub fn play_or_stop(audio: &mut dyn AudioPlayback, music: Option<&str>) {
    match music {
        Some(url) if !url.is_empty() => audio.play(url),
        _ => audio.stop(),
    }
}

/// Playback that only logs.
#[derive(Debug, Default)]
pub struct NullPlayback;

impl AudioPlayback for NullPlayback {
    fn play(&mut self, url: &str) {
        debug!(bytes = url.len(), "Music play requested");
    }

    fn stop(&mut self) {
        debug!("Music stop requested");
    }
}

/// One call made to a [`RecordingPlayback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCall {
    Play(String),
    Stop,
}

/// Playback that records calls and tracks what would be audible.
#[derive(Debug, Default)]
pub struct RecordingPlayback {
    pub calls: Vec<PlaybackCall>,
    now_playing: Option<String>,
}

impl RecordingPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.now_playing.as_deref()
    }
}

impl AudioPlayback for RecordingPlayback {
    fn play(&mut self, url: &str) {
        self.calls.push(PlaybackCall::Play(url.to_string()));
        self.now_playing = Some(url.to_string());
    }

    fn stop(&mut self) {
        self.calls.push(PlaybackCall::Stop);
        self.now_playing = None;
    }
}
