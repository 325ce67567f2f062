//! Keyboard and mouse state for the viewer.
//!
//! [`Input`] tracks instantaneous events (key just pressed) and continuous
//! state (key held down). With the `viewer` feature it is fed from winit
//! window events; without it, tests drive it through [`Input::press`] and
//! [`Input::release`].
//!
//! [`KeyboardGestures`] turns held keys into [`GestureFrame`]s so the tree can
//! be driven without a camera:
//!
//! | Key            | Gesture          |
//! |----------------|------------------|
//! | `F`            | closed fist      |
//! | `P`            | open palm        |
//! | `Space`        | pinch            |
//! | `Left`/`Right` | hand rotation    |

use crate::gesture::{GestureFrame, GestureLabel};
use glam::Vec2;
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keys the viewer reacts to. Everything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    F,
    P,
    T,
    R,
    Space,
    Escape,
    Left,
    Right,
    Other,
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,
    mouse_released: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    /// Drag distance since the left button went down.
    drag_distance: f32,

    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key was pressed this frame (just went down).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Mouse position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement since last frame in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Positive values indicate scrolling up/forward.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// A left release that barely moved counts as a click, not an orbit drag.
    pub fn clicked(&self) -> bool {
        self.mouse_released(MouseButton::Left) && self.drag_distance < 4.0
    }

    /// Clear per-frame state. Call after the frame consumed it.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    pub fn press(&mut self, key: KeyCode) {
        // No repeat: a held key fires `pressed` once.
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        if button == MouseButton::Left {
            self.drag_distance = 0.0;
        }
        self.mouse_pressed.insert(button);
        self.mouse_held.insert(button);
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
        self.mouse_released.insert(button);
    }

    pub fn move_mouse(&mut self, position: Vec2) {
        let delta = position - self.mouse_position;
        self.mouse_delta += delta;
        if self.mouse_held(MouseButton::Left) {
            self.drag_distance += delta.length();
        }
        self.mouse_position = position;
    }

    pub fn scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }
}

#[cfg(feature = "viewer")]
mod winit_events {
    use super::{Input, KeyCode, MouseButton};
    use glam::Vec2;
    use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
    use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

    impl From<WinitKeyCode> for KeyCode {
        fn from(key: WinitKeyCode) -> Self {
            match key {
                WinitKeyCode::KeyF => KeyCode::F,
                WinitKeyCode::KeyP => KeyCode::P,
                WinitKeyCode::KeyT => KeyCode::T,
                WinitKeyCode::KeyR => KeyCode::R,
                WinitKeyCode::Space => KeyCode::Space,
                WinitKeyCode::Escape => KeyCode::Escape,
                WinitKeyCode::ArrowLeft => KeyCode::Left,
                WinitKeyCode::ArrowRight => KeyCode::Right,
                _ => KeyCode::Other,
            }
        }
    }

    impl From<WinitMouseButton> for MouseButton {
        fn from(btn: WinitMouseButton) -> Self {
            match btn {
                WinitMouseButton::Right => MouseButton::Right,
                WinitMouseButton::Middle => MouseButton::Middle,
                _ => MouseButton::Left,
            }
        }
    }

    impl Input {
        /// Process a winit window event.
        pub fn handle_event(&mut self, event: &WindowEvent) {
            match event {
                WindowEvent::KeyboardInput { event, .. } => {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        match event.state {
                            ElementState::Pressed => self.press(code.into()),
                            ElementState::Released => self.release(code.into()),
                        }
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => match state {
                    ElementState::Pressed => self.press_mouse((*button).into()),
                    ElementState::Released => self.release_mouse((*button).into()),
                },
                WindowEvent::CursorMoved { position, .. } => {
                    self.move_mouse(Vec2::new(position.x as f32, position.y as f32));
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    self.scroll(match delta {
                        MouseScrollDelta::LineDelta(_, y) => *y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                    });
                }
                _ => {}
            }
        }
    }
}

/// Stand-in gesture recognizer driven by held keys.
#[derive(Debug, Clone, Copy)]
pub struct KeyboardGestures {
    /// Rotation reported while an arrow key is held.
    pub rotation_step: f32,
}

impl Default for KeyboardGestures {
    fn default() -> Self {
        Self { rotation_step: 0.5 }
    }
}

impl KeyboardGestures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame for the current key state. Like a camera that sees no hand, an
    /// idle keyboard still reports a frame with zero rotation.
    pub fn frame(&self, input: &Input, timestamp_ms: u64) -> GestureFrame {
        let label = if input.key_held(KeyCode::F) {
            GestureLabel::ClosedFist
        } else if input.key_held(KeyCode::P) {
            GestureLabel::OpenPalm
        } else {
            GestureLabel::None
        };
        let rotation = match (input.key_held(KeyCode::Left), input.key_held(KeyCode::Right)) {
            (true, false) => -self.rotation_step,
            (false, true) => self.rotation_step,
            _ => 0.0,
        };
        GestureFrame::new(timestamp_ms, label)
            .with_pinch(input.key_held(KeyCode::Space))
            .with_rotation(rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pressed_fires_once() {
        let mut input = Input::new();
        input.press(KeyCode::T);
        assert!(input.key_pressed(KeyCode::T));
        input.end_frame();
        input.press(KeyCode::T);
        assert!(!input.key_pressed(KeyCode::T));
        assert!(input.key_held(KeyCode::T));
        input.release(KeyCode::T);
        assert!(!input.key_held(KeyCode::T));
    }

    #[test]
    fn test_short_release_is_click_long_drag_is_not() {
        let mut input = Input::new();
        input.press_mouse(MouseButton::Left);
        input.move_mouse(Vec2::new(1.0, 1.0));
        input.release_mouse(MouseButton::Left);
        assert!(input.clicked());
        input.end_frame();

        input.press_mouse(MouseButton::Left);
        input.move_mouse(Vec2::new(100.0, 1.0));
        input.release_mouse(MouseButton::Left);
        assert!(!input.clicked());
    }

    #[test]
    fn test_keyboard_gestures() {
        let keys = KeyboardGestures::new();
        let mut input = Input::new();
        let idle = keys.frame(&input, 0);
        assert_eq!(idle.label, GestureLabel::None);
        assert_eq!(idle.rotation, 0.0);
        assert!(!idle.pinching);

        input.press(KeyCode::F);
        let frame = keys.frame(&input, 10);
        assert_eq!(frame.label, GestureLabel::ClosedFist);
        assert_eq!(frame.timestamp_ms, 10);

        input.release(KeyCode::F);
        input.press(KeyCode::Space);
        input.press(KeyCode::Right);
        let frame = keys.frame(&input, 20);
        assert_eq!(frame.label, GestureLabel::None);
        assert!(frame.pinching);
        assert_eq!(frame.rotation, 0.5);
    }
}
