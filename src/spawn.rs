//! Spatial distributions for the two particle configurations.
//!
//! Every particle gets two endpoints at creation: a scattered point inside a
//! sphere and a target point on the cone silhouette of the tree. Neither
//! sampler is uniform: scatter points bunch toward the center and cone points
//! toward the apex.
//!
//! ```ignore
//! let mut ctx = SpawnContext::seeded(7);
//! let scatter = ctx.scatter_point(35.0);
//! let target = ctx.cone_point(18.0, 6.0 * 0.9);
//! ```

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random point inside a sphere of `radius`.
///
/// Direction is a normalized `uniform(-0.5, 0.5)³` vector and the magnitude is
/// `radius × uniform(0, 1)`. Without the cube root the cloud is denser toward
/// the center than a volume-uniform sample would be.
pub fn scatter_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let direction = Vec3::new(
        rng.gen::<f32>() - 0.5,
        rng.gen::<f32>() - 0.5,
        rng.gen::<f32>() - 0.5,
    )
    .normalize_or_zero();
    direction * (radius * rng.gen::<f32>())
}

/// Random point on the cone silhouette, apex up, base centered `-height / 2`.
pub fn cone_point<R: Rng + ?Sized>(rng: &mut R, height: f32, base_radius: f32) -> Vec3 {
    cone_point_with_offset(rng, height, base_radius, -height / 2.0)
}

/// Random point on the cone silhouette with an explicit vertical offset.
///
/// `θ = uniform(0, 2π)`, `y = uniform(0, height)` and the radius shrinks
/// linearly from `base_radius` at `y = 0` to zero at the apex.
pub fn cone_point_with_offset<R: Rng + ?Sized>(
    rng: &mut R,
    height: f32,
    base_radius: f32,
    y_offset: f32,
) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let y = rng.gen::<f32>() * height;
    let r = if height > 0.0 {
        base_radius * (height - y) / height
    } else {
        0.0
    };
    Vec3::new(r * theta.cos(), y + y_offset, r * theta.sin())
}

/// Outward surface normal of the cone at a point produced by [`cone_point`].
///
/// Points on the axis (the apex) get `+Y`.
pub fn cone_normal(point: Vec3, height: f32, base_radius: f32) -> Vec3 {
    let radial = Vec3::new(point.x, 0.0, point.z);
    let len = radial.length();
    if len < 1e-5 {
        return Vec3::Y;
    }
    let dir = radial / len;
    Vec3::new(dir.x * height, base_radius, dir.z * height).normalize_or_zero()
}

/// Seeded random source used while generating a particle set.
///
/// Seeding from a fixed value gives a reproducible layout; otherwise the seed
/// is taken from the clock so each run looks different.
#[derive(Debug, Clone)]
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context seeded from the system clock.
    pub fn from_entropy() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::seeded(seed)
    }

    /// Create a context with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, clock-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random index below `len`.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        (self.random() * len as f32) as usize % len.max(1)
    }

    /// Independent context seeded from this one.
    pub fn fork(&mut self) -> Self {
        Self::seeded(self.rng.gen())
    }

    /// See [`scatter_point`].
    pub fn scatter_point(&mut self, radius: f32) -> Vec3 {
        scatter_point(&mut self.rng, radius)
    }

    /// See [`cone_point`].
    pub fn cone_point(&mut self, height: f32, base_radius: f32) -> Vec3 {
        cone_point(&mut self.rng, height, base_radius)
    }

    /// Random point inside an axis-aligned box centered on X/Z, spanning
    /// `0..height` on Y.
    pub fn random_in_column(&mut self, half_width: f32, height: f32) -> Vec3 {
        Vec3::new(
            (self.random() - 0.5) * half_width * 2.0,
            self.random() * height,
            (self.random() - 0.5) * half_width * 2.0,
        )
    }
}

/// Color from a `0xRRGGBB` literal, channels in `0.0..=1.0`.
pub fn hex_color(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xFF) as f32 / 255.0,
        ((rgb >> 8) & 0xFF) as f32 / 255.0,
        (rgb & 0xFF) as f32 / 255.0,
    )
}
