//! Ornament particles and their creation-time attributes.

use crate::spawn::{hex_color, SpawnContext};
use crate::Vec3;
use std::f32::consts::TAU;

/// Ornament category, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleCategory {
    /// Plain ornament, never opened.
    Decorative,
    /// Gift box that can reveal a memory.
    Gift,
}

/// Weighted festive palette used for gift boxes (duplicates act as weights).
pub const FESTIVE_PALETTE: [u32; 10] = [
    0xD42426, // red
    0xD4AF37, 0xD4AF37, 0xD4AF37, // gold
    0xC0C0C0, 0xC0C0C0, // silver
    0x1446A0, 0x1446A0, // blue
    0x5D3FD3, // royal purple
    0xE6E6FA, // lavender
];

/// One ornament instance.
///
/// Positions and the randomized animation constants never change after
/// creation. Memory association is derived from `id` elsewhere, so replacing
/// the memory collection cannot move a particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Stable index within its group.
    pub id: u32,
    /// Endpoint in the scattered configuration.
    pub scatter_position: Vec3,
    /// Endpoint in the tree configuration.
    pub target_position: Vec3,
    /// Multiplier on the group's base scale (`0.5..1.0`).
    pub scale_factor: f32,
    /// Spin speed (`-1.0..1.0`).
    pub rotation_speed: f32,
    /// Phase of the vertical float (`0..2π`).
    pub phase_offset: f32,
    pub category: ParticleCategory,
    /// Instance color (RGB, 0-1).
    pub color: Vec3,
}

impl Particle {
    /// A particle that sits still at `position` in both configurations.
    ///
    /// Mostly useful for tests and hand-placed ornaments.
    pub fn fixed(id: u32, position: Vec3, category: ParticleCategory) -> Self {
        Self {
            id,
            scatter_position: position,
            target_position: position,
            scale_factor: 1.0,
            rotation_speed: 0.0,
            phase_offset: 0.0,
            category,
            color: Vec3::ONE,
        }
    }

    #[inline]
    pub fn is_gift(&self) -> bool {
        self.category == ParticleCategory::Gift
    }
}

/// Geometry of one ornament group's two configurations.
#[derive(Debug, Clone, Copy)]
pub struct GroupLayout {
    pub scatter_radius: f32,
    pub tree_height: f32,
    /// Cone base radius (already scaled by the group's radius factor).
    pub tree_radius: f32,
    /// Probability that a particle is a gift (`0.0..=1.0`).
    pub gift_ratio: f32,
    /// Color for decorative particles.
    pub base_color: Vec3,
}

/// Generate `count` particles with ids `0..count`.
///
/// Random draws per particle happen in a fixed order: scatter, target,
/// scale, spin, phase, category, color.
pub fn generate(count: u32, layout: &GroupLayout, ctx: &mut SpawnContext) -> Vec<Particle> {
    (0..count)
        .map(|id| {
            let scatter_position = ctx.scatter_point(layout.scatter_radius);
            let target_position = ctx.cone_point(layout.tree_height, layout.tree_radius);
            let scale_factor = ctx.random() * 0.5 + 0.5;
            let rotation_speed = (ctx.random() - 0.5) * 2.0;
            let phase_offset = ctx.random() * TAU;
            let is_gift = ctx.random() < layout.gift_ratio;
            let festive = hex_color(FESTIVE_PALETTE[ctx.random_index(FESTIVE_PALETTE.len())]);
            let (category, color) = if is_gift {
                (ParticleCategory::Gift, festive)
            } else {
                (ParticleCategory::Decorative, layout.base_color)
            };
            Particle {
                id,
                scatter_position,
                target_position,
                scale_factor,
                rotation_speed,
                phase_offset,
                category,
                color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(gift_ratio: f32) -> GroupLayout {
        GroupLayout {
            scatter_radius: 35.0,
            tree_height: 18.0,
            tree_radius: 5.4,
            gift_ratio,
            base_color: Vec3::new(0.5, 0.0, 0.0),
        }
    }

    #[test]
    fn test_generate_ids_are_sequential() {
        let mut ctx = SpawnContext::seeded(11);
        let particles = generate(50, &layout(0.3), &mut ctx);
        assert_eq!(particles.len(), 50);
        for (i, p) in particles.iter().enumerate() {
            assert_eq!(p.id, i as u32);
        }
    }

    #[test]
    fn test_generate_attribute_ranges() {
        let mut ctx = SpawnContext::seeded(12);
        for p in generate(500, &layout(0.3), &mut ctx) {
            assert!((0.5..=1.0).contains(&p.scale_factor));
            assert!((-1.0..=1.0).contains(&p.rotation_speed));
            assert!((0.0..=TAU).contains(&p.phase_offset));
        }
    }

    #[test]
    fn test_gift_ratio_roughly_respected() {
        let mut ctx = SpawnContext::seeded(13);
        let particles = generate(2000, &layout(0.3), &mut ctx);
        let gifts = particles.iter().filter(|p| p.is_gift()).count();
        let ratio = gifts as f32 / 2000.0;
        assert!(ratio > 0.25 && ratio < 0.35, "ratio {ratio}");
    }

    #[test]
    fn test_zero_ratio_has_no_gifts() {
        let mut ctx = SpawnContext::seeded(14);
        let particles = generate(200, &layout(0.0), &mut ctx);
        assert!(particles.iter().all(|p| !p.is_gift()));
        assert!(particles.iter().all(|p| p.color == Vec3::new(0.5, 0.0, 0.0)));
    }
}
