//! Frame clock.
//!
//! [`Time`] is the single source of `elapsed` and `delta` for a frame. The
//! viewer drives it from the wall clock; headless runs use
//! [`Time::simulated`] and step it by a fixed delta, so a scripted run gives
//! the same result on every machine.
//!
//! ```ignore
//! let mut time = Time::new();
//! loop {
//!     let (elapsed, dt) = time.update();
//!     scene.frame(dt, elapsed);
//! }
//! ```

use std::time::{Duration, Instant};

/// Longest delta a single frame may report, in seconds.
///
/// A stalled window (dragging, breakpoints) otherwise snaps every transition
/// to its end in one frame.
pub const MAX_DELTA: f32 = 0.1;

#[derive(Debug, Clone, Copy)]
enum Source {
    Wall { start: Instant, last_frame: Instant },
    Simulated { step: f32 },
}

/// Frame timing: elapsed and delta seconds, frame count, FPS and pause.
#[derive(Debug)]
pub struct Time {
    source: Source,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_window: f32,
    paused: bool,
    time_scale: f32,
}

impl Time {
    /// Wall-clock timer starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self::with_source(Source::Wall {
            start: now,
            last_frame: now,
        })
    }

    /// Deterministic timer that advances by `step` seconds per update.
    pub fn simulated(step: f32) -> Self {
        Self::with_source(Source::Simulated { step: step.max(0.0) })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window: 0.0,
            paused: false,
            time_scale: 1.0,
        }
    }

    /// Advance one frame. Returns `(elapsed, delta)`.
    pub fn update(&mut self) -> (f32, f32) {
        let raw_delta = match &mut self.source {
            Source::Wall { last_frame, .. } => {
                let now = Instant::now();
                let delta = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;
                delta
            }
            Source::Simulated { step } => *step,
        };
        self.advance(raw_delta)
    }

    /// Advance by an explicit `delta` seconds, regardless of the source.
    pub fn advance(&mut self, delta: f32) -> (f32, f32) {
        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }
        self.delta_secs = delta.clamp(0.0, MAX_DELTA) * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        self.fps_window += delta;
        if self.fps_window >= 0.5 {
            self.fps = (self.frame_count - self.fps_frame_count) as f32 / self.fps_window;
            self.fps_frame_count = self.frame_count;
            self.fps_window = 0.0;
        }
        (self.elapsed_secs, self.delta_secs)
    }

    /// Scene time in seconds. Stops while paused.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Scene time in whole milliseconds, for gesture timestamps.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        (self.elapsed_secs as f64 * 1000.0).round() as u64
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Wall time since the timer started; zero for simulated timers.
    pub fn wall_elapsed(&self) -> Duration {
        match self.source {
            Source::Wall { start, .. } => start.elapsed(),
            Source::Simulated { .. } => Duration::ZERO,
        }
    }

    /// While paused, `delta()` is 0 and `elapsed()` stops.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            if let Source::Wall { last_frame, .. } = &mut self.source {
                *last_frame = Instant::now();
            }
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// `1.0` is normal speed. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
