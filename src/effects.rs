//! Decorative effects around the tree: the spiral of sparkles, the star on
//! top, falling snow and the opened-gift card animation.
//!
//! None of these carry interaction state. They read the scene mode each
//! frame and produce transforms or sprites for the render delegate.

use crate::easing::{approach, lerp, smoothstep};
use crate::render::PointSprite;
use crate::spawn::{hex_color, SpawnContext};
use crate::transition::{InstanceTransform, ParticlePose};
use crate::Vec3;
use glam::{Mat4, Vec2};
use std::f32::consts::TAU;

/// Spiral sprite colors, sky blue to light cyan.
const SPIRAL_COLOR_START: u32 = 0x87CEEB;
const SPIRAL_COLOR_END: u32 = 0xE0FFFF;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpiralPoint {
    seed: f32,
    speed: f32,
    offset: f32,
    radius: f32,
}

/// Sparkles climbing a helix just outside the cone.
#[derive(Debug, Clone)]
pub struct SpiralCloud {
    points: Vec<SpiralPoint>,
    height: f32,
    opacity: f32,
    fade_rate: f32,
}

impl SpiralCloud {
    pub fn generate(count: u32, tree_height: f32, tree_radius: f32, ctx: &mut SpawnContext) -> Self {
        let points = (0..count)
            .map(|_| SpiralPoint {
                seed: ctx.random(),
                speed: ctx.random() * 0.5 + 0.3,
                offset: ctx.random() * tree_height,
                radius: tree_radius * 1.2 + ctx.random() * 1.8,
            })
            .collect();
        Self {
            points,
            height: tree_height,
            opacity: 0.0,
            fade_rate: 2.0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Overall opacity, faded toward 1 in tree mode.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn update(&mut self, tree_shape: bool, dt: f32) {
        let target = if tree_shape { 1.0 } else { 0.0 };
        self.opacity = approach(self.opacity, target, self.fade_rate, dt);
    }

    /// Sprite for point `index` at `time`, in group space.
    pub fn sprite(&self, index: usize, time: f32) -> Option<PointSprite> {
        let p = self.points.get(index)?;
        let raw_height = (time * p.speed + p.offset).rem_euclid(self.height);
        let climb = raw_height / self.height;
        let r = p.radius * (1.0 - climb);
        let angle = time * 0.2 + raw_height + p.seed * TAU;
        let position = Vec3::new(angle.cos() * r, raw_height - self.height * 0.5, angle.sin() * r);

        let mix = (time + p.seed * 3.0).sin() * 0.5 + 0.5;
        let color = hex_color(SPIRAL_COLOR_START).lerp(hex_color(SPIRAL_COLOR_END), mix);
        let edge = smoothstep(0.0, 0.15, climb) * (1.0 - smoothstep(0.85, 1.0, climb));

        Some(PointSprite {
            position: position.to_array(),
            size: 0.7 * p.seed + 0.3,
            color: color.to_array(),
            opacity: edge * self.opacity,
        })
    }

    /// Write every sprite into `out`. Nothing is written while fully faded.
    pub fn write_sprites(&self, time: f32, out: &mut Vec<PointSprite>) {
        out.clear();
        if self.opacity <= f32::EPSILON {
            return;
        }
        out.extend((0..self.points.len()).filter_map(|i| self.sprite(i, time)));
    }
}

/// Star on top of the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeStar {
    pub position: Vec3,
    pub rotation_y: f32,
    pub scale: f32,
}

impl Default for TreeStar {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, Self::HEIGHT, 0.0),
            rotation_y: 0.0,
            scale: 0.0,
        }
    }
}

impl TreeStar {
    pub const HEIGHT: f32 = 10.5;
    pub const COLOR: u32 = 0xFFD700;
    /// Fraction of the remaining scale covered per frame.
    const GROW: f32 = 0.1;

    /// Spin and bob while the tree is formed; shrink away otherwise.
    pub fn update(&mut self, tree_shape: bool, elapsed: f32) {
        if tree_shape {
            self.rotation_y = elapsed;
            self.position.y = Self::HEIGHT + (elapsed * 2.0).sin() * 0.1;
            self.scale = lerp(self.scale, 1.0, Self::GROW);
        } else {
            self.scale = lerp(self.scale, 0.0, Self::GROW);
        }
    }

    pub fn transform(&self) -> InstanceTransform {
        let pose = ParticlePose {
            position: self.position,
            rotation: Vec3::new(0.0, self.rotation_y, 0.0),
            scale: self.scale * 0.8,
        };
        InstanceTransform::from_mat4(pose.to_matrix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Flake {
    position: Vec3,
    velocity: Vec3,
    rotation: f32,
    rotation_speed: f32,
    scale: f32,
    wobble: f32,
    wobble_speed: f32,
}

/// Falling snow, advanced in units of 60 Hz frames.
#[derive(Debug, Clone)]
pub struct Snowfall {
    flakes: Vec<Flake>,
    area: f32,
    ctx: SpawnContext,
}

impl Snowfall {
    /// Flakes below this height respawn at the top.
    pub const FLOOR: f32 = -10.0;

    pub fn generate(count: u32, area: f32, speed: f32, mut ctx: SpawnContext) -> Self {
        let flakes = (0..count)
            .map(|_| {
                let position = ctx.random_in_column(area * 0.5, area);
                let velocity = Vec3::new(
                    (ctx.random() - 0.5) * 0.02,
                    -(ctx.random() * 0.5 + 0.5) * speed * 0.05,
                    (ctx.random() - 0.5) * 0.02,
                );
                Flake {
                    position,
                    velocity,
                    rotation: ctx.random() * TAU,
                    rotation_speed: (ctx.random() - 0.5) * 0.02,
                    scale: ctx.random() * 0.08 + 0.02,
                    wobble: ctx.random() * TAU,
                    wobble_speed: ctx.random() * 0.02 + 0.01,
                }
            })
            .collect();
        Self { flakes, area, ctx }
    }

    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    pub fn update(&mut self, dt: f32) {
        let frames = dt * 60.0;
        let half = self.area * 0.5;
        for flake in &mut self.flakes {
            flake.position += flake.velocity * frames;
            flake.wobble += flake.wobble_speed * frames;
            flake.rotation += flake.rotation_speed * frames;
            if flake.position.y < Self::FLOOR {
                flake.position = Vec3::new(
                    (self.ctx.random() - 0.5) * self.area,
                    half,
                    (self.ctx.random() - 0.5) * self.area,
                );
            }
        }
    }

    /// Lowest flake height, mostly for tests.
    pub fn min_height(&self) -> Option<f32> {
        self.flakes.iter().map(|f| f.position.y).reduce(f32::min)
    }

    pub fn write_transforms(&self, out: &mut Vec<InstanceTransform>) {
        out.clear();
        out.extend(self.flakes.iter().map(|f| {
            let position = Vec3::new(
                f.position.x + f.wobble.sin() * 0.02,
                f.position.y,
                f.position.z + (f.wobble * 0.7).cos() * 0.02,
            );
            let pose = ParticlePose {
                position,
                rotation: Vec3::new(f.rotation, f.rotation * 0.5, 0.0),
                scale: f.scale,
            };
            InstanceTransform::from_mat4(pose.to_matrix())
        }));
    }
}

/// Card flying out of an opened gift toward the middle of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiftReveal {
    origin: Vec3,
    progress: f32,
}

impl GiftReveal {
    /// Per-second approach rate of the card.
    pub const RATE: f32 = 5.0;
    /// Scale of the card while still inside the gift.
    pub const START_SCALE: f32 = 0.1;
    /// Card anchor, as fractions of the viewport.
    pub const ANCHOR: Vec2 = Vec2::new(0.5, 0.4);

    pub fn new(origin: Vec3) -> Self {
        Self {
            origin,
            progress: 0.0,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn update(&mut self, dt: f32) {
        self.progress = approach(self.progress, 1.0, Self::RATE, dt);
    }

    pub fn is_settled(&self) -> bool {
        self.progress > 0.99
    }

    pub fn scale(&self) -> f32 {
        lerp(Self::START_SCALE, 1.0, self.progress)
    }

    /// Card contents fade in over the second half of the flight.
    pub fn content_opacity(&self) -> f32 {
        smoothstep(0.5, 1.0, self.progress)
    }

    /// Card center in pixels, given the frame's view-projection.
    pub fn screen_position(&self, view_proj: Mat4, viewport: Vec2) -> Vec2 {
        let start = project_to_screen(view_proj, self.origin, viewport);
        start.lerp(Self::ANCHOR * viewport, self.progress)
    }
}

/// Project a world point to pixel coordinates (origin top-left).
pub fn project_to_screen(view_proj: Mat4, point: Vec3, viewport: Vec2) -> Vec2 {
    let ndc = view_proj.project_point3(point);
    Vec2::new((ndc.x * 0.5 + 0.5) * viewport.x, (-ndc.y * 0.5 + 0.5) * viewport.y)
}
