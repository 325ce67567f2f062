//! Hand gestures to scene actions.
//!
//! An external recognizer produces one [`InferenceResult`] per video frame.
//! [`GestureInput`] turns those into [`GestureFrame`]s: it skips repeated
//! video timestamps, drops low-confidence labels, derives rotation and pinch
//! from the hand landmarks, and swallows per-frame inference errors.
//! [`GestureMapper`] then debounces the frames into discrete
//! [`SceneAction`]s.
//!
//! ```text
//! recognizer ──▶ GestureInput ──▶ GestureFrame ──▶ GestureMapper ──▶ SceneAction
//! ```

use crate::config::GestureConfig;
use crate::error::InferenceError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Recognized hand pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GestureLabel {
    #[default]
    #[serde(rename = "None")]
    None,
    #[serde(rename = "Closed_Fist")]
    ClosedFist,
    #[serde(rename = "Open_Palm")]
    OpenPalm,
    #[serde(rename = "Victory")]
    Victory,
    #[serde(rename = "Pointing_Up")]
    PointingUp,
    #[serde(rename = "Thumb_Up")]
    ThumbUp,
    #[serde(rename = "Thumb_Down")]
    ThumbDown,
    #[serde(rename = "ILoveYou")]
    ILoveYou,
}

impl GestureLabel {
    /// Label for a recognizer category name. Unknown names map to `None`.
    pub fn from_category(name: &str) -> Self {
        match name {
            "Closed_Fist" => Self::ClosedFist,
            "Open_Palm" => Self::OpenPalm,
            "Victory" => Self::Victory,
            "Pointing_Up" => Self::PointingUp,
            "Thumb_Up" => Self::ThumbUp,
            "Thumb_Down" => Self::ThumbDown,
            "ILoveYou" => Self::ILoveYou,
            _ => Self::None,
        }
    }
}

/// Per-frame gesture signal consumed by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureFrame {
    /// Milliseconds on a monotonic clock.
    #[serde(rename = "t_ms")]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub label: GestureLabel,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub pinching: bool,
}

impl GestureFrame {
    pub fn new(timestamp_ms: u64, label: GestureLabel) -> Self {
        Self {
            timestamp_ms,
            label,
            ..Default::default()
        }
    }

    pub fn with_pinch(mut self, pinching: bool) -> Self {
        self.pinching = pinching;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Normalized image-space landmark.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// Landmark indices used for derivation.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    /// Landmarks per hand.
    pub const COUNT: usize = 21;
}

/// Top gesture category of a recognizer result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub score: f32,
}

/// One recognizer output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Playback time of the video frame this result belongs to, in seconds.
    pub video_time: f64,
    /// First hand's landmarks, if a hand was found.
    pub landmarks: Option<Vec<Landmark>>,
    pub gesture: Option<Category>,
}

impl InferenceResult {
    /// Derive the mapper input from this result.
    ///
    /// A missing hand gives zero rotation and no pinch; a label at or below
    /// `min_score` counts as `None`.
    pub fn to_frame(&self, config: &GestureConfig, timestamp_ms: u64) -> GestureFrame {
        let mut frame = GestureFrame::new(timestamp_ms, GestureLabel::None);
        if let Some(lm) = self.landmarks.as_deref().filter(|lm| lm.len() >= landmark::COUNT) {
            let wrist = lm[landmark::WRIST];
            let knuckle = lm[landmark::MIDDLE_MCP];
            frame.rotation = (knuckle.x - wrist.x) * config.rotation_gain;

            let thumb = lm[landmark::THUMB_TIP];
            let index = lm[landmark::INDEX_TIP];
            let distance = (thumb.x - index.x).hypot(thumb.y - index.y);
            frame.pinching = distance < config.pinch_distance;
        }
        if let Some(category) = &self.gesture {
            if category.score > config.min_score {
                frame.label = GestureLabel::from_category(&category.name);
            }
        }
        frame
    }
}

/// Skips results for a video frame that was already processed.
#[derive(Debug, Clone, Default)]
pub struct InferenceGuard {
    last_video_time: Option<f64>,
}

impl InferenceGuard {
    /// `true` (and remembers `video_time`) when this is a new frame.
    pub fn accept(&mut self, video_time: f64) -> bool {
        if self.last_video_time == Some(video_time) {
            return false;
        }
        self.last_video_time = Some(video_time);
        true
    }
}

/// Gesture recognizer collaborator.
pub trait GestureSource {
    /// Result for the latest video frame, or `None` when nothing is ready.
    fn poll(&mut self) -> Option<Result<InferenceResult, InferenceError>>;
}

/// Wraps a [`GestureSource`] with deduplication and error swallowing.
#[derive(Debug)]
pub struct GestureInput<S> {
    source: S,
    guard: InferenceGuard,
    config: GestureConfig,
}

impl<S: GestureSource> GestureInput<S> {
    pub fn new(source: S, config: GestureConfig) -> Self {
        Self {
            source,
            guard: InferenceGuard::default(),
            config,
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Next frame for the mapper, if the source produced a fresh result.
    ///
    /// Inference errors skip the frame; the mapper keeps its previous state.
    pub fn poll(&mut self, now_ms: u64) -> Option<GestureFrame> {
        match self.source.poll()? {
            Ok(result) => {
                if !self.guard.accept(result.video_time) {
                    return None;
                }
                Some(result.to_frame(&self.config, now_ms))
            }
            Err(e) => {
                warn!(error = %e, "Gesture inference failed, skipping frame");
                None
            }
        }
    }
}

/// Discrete or continuous scene change requested by a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneAction {
    /// New target Y rotation of the tree group.
    Rotate(f32),
    /// Form the tree.
    Summon,
    /// Scatter the tree.
    Scatter,
    CloseActive,
    OpenNearest,
}

/// Scene state the mapper needs to pick actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapperContext {
    pub tree_shape: bool,
    pub has_active: bool,
}

/// Debounces gesture frames into [`SceneAction`]s.
#[derive(Debug, Clone)]
pub struct GestureMapper {
    discrete_cooldown_ms: u64,
    pinch_cooldown_ms: u64,
    last_discrete_ms: Option<u64>,
    last_pinch_ms: Option<u64>,
    was_pinching: bool,
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new(&GestureConfig::default())
    }
}

fn cooled_down(last: Option<u64>, now: u64, cooldown: u64) -> bool {
    last.map_or(true, |last| now.saturating_sub(last) >= cooldown)
}

impl GestureMapper {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            discrete_cooldown_ms: config.discrete_cooldown_ms,
            pinch_cooldown_ms: config.pinch_cooldown_ms,
            last_discrete_ms: None,
            last_pinch_ms: None,
            was_pinching: false,
        }
    }

    pub fn was_pinching(&self) -> bool {
        self.was_pinching
    }

    /// Map one frame to actions, in the order they should be applied.
    ///
    /// Guards later in the frame see the effect of earlier actions: a fist
    /// that forms the tree also blocks a pinch in the same frame.
    pub fn process(&mut self, frame: &GestureFrame, ctx: MapperContext) -> Vec<SceneAction> {
        let now = frame.timestamp_ms;
        let mut state = ctx;
        let mut actions = Vec::new();

        if !state.tree_shape {
            actions.push(SceneAction::Rotate(frame.rotation));
        }

        if cooled_down(self.last_discrete_ms, now, self.discrete_cooldown_ms) {
            match frame.label {
                GestureLabel::ClosedFist => {
                    actions.push(SceneAction::Summon);
                    state.tree_shape = true;
                    self.last_discrete_ms = Some(now);
                    debug!(t_ms = now, "Fist: summon tree");
                }
                GestureLabel::OpenPalm => {
                    if state.has_active {
                        actions.push(SceneAction::CloseActive);
                        state.has_active = false;
                        debug!(t_ms = now, "Palm: close gift");
                    } else {
                        actions.push(SceneAction::Scatter);
                        state.tree_shape = false;
                        debug!(t_ms = now, "Palm: scatter tree");
                    }
                    self.last_discrete_ms = Some(now);
                }
                _ => {}
            }
        }

        let rising = frame.pinching && !self.was_pinching;
        if rising
            && !state.tree_shape
            && !state.has_active
            && cooled_down(self.last_pinch_ms, now, self.pinch_cooldown_ms)
        {
            actions.push(SceneAction::OpenNearest);
            self.last_pinch_ms = Some(now);
            debug!(t_ms = now, "Pinch: open nearest gift");
        }
        self.was_pinching = frame.pinching;

        actions
    }
}

/// Recorded gesture frames, loadable from JSON for headless runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureScript {
    pub frames: Vec<GestureFrame>,
}

impl GestureScript {
    /// Frames whose timestamp falls in `[from_ms, to_ms)`.
    pub fn window(&self, from_ms: u64, to_ms: u64) -> impl Iterator<Item = &GestureFrame> {
        self.frames
            .iter()
            .filter(move |f| f.timestamp_ms >= from_ms && f.timestamp_ms < to_ms)
    }
}
