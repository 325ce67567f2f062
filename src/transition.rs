//! Per-frame interpolation of ornament transforms between the scattered and
//! tree configurations.
//!
//! The engine owns every particle of a group and one shared `progress` value.
//! Each frame it eases `progress` toward 0 or 1 and writes one
//! [`InstanceTransform`] per particle into the slot that particle owns in its
//! sub-mesh. Slots are assigned by [`SlotMap`] and stay put across frames.

use crate::easing::{approach, ease_in_out_cubic, lerp};
use crate::particle::{Particle, ParticleCategory};
use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Vertical float amplitude while scattered.
pub const FLOAT_AMPLITUDE_SCATTERED: f32 = 2.0;
/// Vertical float amplitude once the tree has formed.
pub const FLOAT_AMPLITUDE_TREE: f32 = 0.2;

/// Model matrix of one drawn instance, laid out for direct upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub model: [[f32; 4]; 4],
}

impl InstanceTransform {
    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            model: m.to_cols_array_2d(),
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    /// Translation part of the matrix.
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }

    /// Uniform scale, read from the first basis column.
    pub fn uniform_scale(&self) -> f32 {
        Vec3::new(self.model[0][0], self.model[0][1], self.model[0][2]).length()
    }
}

/// Decomposed pose of a particle for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePose {
    pub position: Vec3,
    /// Euler angles (X, Y, Z) in radians.
    pub rotation: Vec3,
    pub scale: f32,
}

impl ParticlePose {
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            self.position,
        )
    }
}

/// Mesh shape of a group. Only boxes spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceShape {
    Box,
    Sphere,
}

/// Tunables for one engine.
#[derive(Debug, Clone, Copy)]
pub struct TransitionParams {
    /// Exponential smoothing rate of `progress`, per second.
    pub smoothing_rate: f32,
    /// Base scale multiplied by each particle's `scale_factor`.
    pub scale_base: f32,
    pub shape: InstanceShape,
}

/// Owner of a group's particles and its transition progress.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    particles: Vec<Particle>,
    progress: f32,
    params: TransitionParams,
    /// Elapsed time of the last computed frame.
    elapsed: f32,
}

impl TransitionEngine {
    /// Create an engine in the scattered configuration (`progress = 0`).
    pub fn new(particles: Vec<Particle>, params: TransitionParams) -> Self {
        Self {
            particles,
            progress: 0.0,
            params,
            elapsed: 0.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: u32) -> Option<&Particle> {
        self.particles.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current transition progress in `[0, 1]`.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Jump straight to a progress value (clamped to `[0, 1]`).
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn params(&self) -> &TransitionParams {
        &self.params
    }

    /// Elapsed time used for the most recent frame.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Ease progress toward 1 (tree) or 0 (scattered) by `dt` seconds and
    /// record `elapsed` as the current frame time.
    pub fn advance(&mut self, tree_shape: bool, dt: f32, elapsed: f32) -> f32 {
        let target = if tree_shape { 1.0 } else { 0.0 };
        self.progress = approach(self.progress, target, self.params.smoothing_rate, dt);
        self.elapsed = elapsed;
        self.progress
    }

    /// Position of particle `id` at `elapsed` for the current progress.
    pub fn position_at(&self, id: u32, elapsed: f32) -> Option<Vec3> {
        self.particle(id).map(|p| self.interpolated_position(p, elapsed))
    }

    /// Position of particle `id` as drawn in the last frame.
    pub fn current_position(&self, id: u32) -> Option<Vec3> {
        self.position_at(id, self.elapsed)
    }

    fn interpolated_position(&self, p: &Particle, elapsed: f32) -> Vec3 {
        let t = ease_in_out_cubic(self.progress);
        let mut position = p.scatter_position.lerp(p.target_position, t);
        let float_amp = lerp(FLOAT_AMPLITUDE_SCATTERED, FLOAT_AMPLITUDE_TREE, self.progress);
        position.y += (elapsed + p.phase_offset).sin() * float_amp * 0.1;
        position
    }

    /// Full pose of a particle. `hidden` zeroes the scale (the opened gift).
    pub fn pose(&self, p: &Particle, elapsed: f32, hidden: bool) -> ParticlePose {
        let rotation = match self.params.shape {
            InstanceShape::Box => {
                let angle = elapsed * p.rotation_speed * 0.2;
                Vec3::new(angle, angle, 0.0)
            }
            InstanceShape::Sphere => Vec3::ZERO,
        };
        let scale = if hidden {
            0.0
        } else {
            self.params.scale_base * p.scale_factor
        };
        ParticlePose {
            position: self.interpolated_position(p, elapsed),
            rotation,
            scale,
        }
    }

    /// Write transforms for the particles listed in `ids`, in order, into
    /// `out`. `out[slot]` is the transform of `ids[slot]`.
    pub fn write_transforms(
        &self,
        ids: &[u32],
        elapsed: f32,
        active: Option<u32>,
        out: &mut Vec<InstanceTransform>,
    ) {
        out.clear();
        out.reserve(ids.len());
        for &id in ids {
            let Some(p) = self.particle(id) else {
                out.push(InstanceTransform::zeroed());
                continue;
            };
            let pose = self.pose(p, elapsed, active == Some(id));
            out.push(InstanceTransform::from_mat4(pose.to_matrix()));
        }
    }
}

/// Sub-mesh a particle is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubMesh {
    /// Gift boxes of a partitioned group.
    Gift,
    /// Non-gift ornaments of a partitioned group.
    Decorative,
    /// Single mesh holding every particle of an unpartitioned group.
    All,
}

/// Mapping between particle ids and instance slots of each sub-mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMap {
    partitioned: bool,
    gift: Vec<u32>,
    decorative: Vec<u32>,
    all: Vec<u32>,
}

impl SlotMap {
    /// Build the mapping. Partitioned groups split gifts from decorations,
    /// otherwise every particle lands in [`SubMesh::All`] at its own index.
    pub fn build(particles: &[Particle], partitioned: bool) -> Self {
        let mut map = Self {
            partitioned,
            ..Default::default()
        };
        if partitioned {
            for p in particles {
                match p.category {
                    ParticleCategory::Gift => map.gift.push(p.id),
                    ParticleCategory::Decorative => map.decorative.push(p.id),
                }
            }
        } else {
            map.all = particles.iter().map(|p| p.id).collect();
        }
        map
    }

    /// Rebuild only when group membership differs from the current mapping.
    /// Returns `true` when the mapping changed.
    pub fn rebuild_if_changed(&mut self, particles: &[Particle]) -> bool {
        let fresh = Self::build(particles, self.partitioned);
        if fresh == *self {
            return false;
        }
        *self = fresh;
        true
    }

    pub fn is_partitioned(&self) -> bool {
        self.partitioned
    }

    /// Sub-meshes this map draws, in draw order.
    pub fn sub_meshes(&self) -> &'static [SubMesh] {
        if self.partitioned {
            &[SubMesh::Gift, SubMesh::Decorative]
        } else {
            &[SubMesh::All]
        }
    }

    /// Particle ids of a sub-mesh, indexed by slot.
    pub fn ids(&self, mesh: SubMesh) -> &[u32] {
        match mesh {
            SubMesh::Gift => &self.gift,
            SubMesh::Decorative => &self.decorative,
            SubMesh::All => &self.all,
        }
    }

    /// Particle id drawn at `slot` of `mesh`.
    pub fn particle_at(&self, mesh: SubMesh, slot: usize) -> Option<u32> {
        self.ids(mesh).get(slot).copied()
    }

    /// Slot of particle `id`, searching the sub-meshes in draw order.
    pub fn slot_of(&self, id: u32) -> Option<(SubMesh, usize)> {
        self.sub_meshes().iter().find_map(|&mesh| {
            self.ids(mesh)
                .iter()
                .position(|&candidate| candidate == id)
                .map(|slot| (mesh, slot))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleCategory::{Decorative, Gift};

    fn params(shape: InstanceShape) -> TransitionParams {
        TransitionParams {
            smoothing_rate: 2.0,
            scale_base: 0.8,
            shape,
        }
    }

    fn moving(id: u32) -> Particle {
        Particle {
            scatter_position: Vec3::new(-10.0, 0.0, 0.0),
            target_position: Vec3::new(10.0, 0.0, 0.0),
            ..Particle::fixed(id, Vec3::ZERO, Decorative)
        }
    }

    #[test]
    fn test_progress_converges_monotonically() {
        let mut engine = TransitionEngine::new(vec![moving(0)], params(InstanceShape::Box));
        let mut last = engine.progress();
        for frame in 0..600 {
            let p = engine.advance(true, 1.0 / 60.0, frame as f32 / 60.0);
            assert!(p >= last && p <= 1.0);
            last = p;
        }
        assert!(last > 0.999);
        for frame in 0..600 {
            let p = engine.advance(false, 1.0 / 60.0, frame as f32 / 60.0);
            assert!(p <= last && p >= 0.0);
            last = p;
        }
        assert!(last < 0.001);
    }

    #[test]
    fn test_progress_is_frame_rate_independent() {
        let mut fast = TransitionEngine::new(vec![], params(InstanceShape::Box));
        let mut slow = TransitionEngine::new(vec![], params(InstanceShape::Box));
        for _ in 0..120 {
            fast.advance(true, 1.0 / 120.0, 0.0);
        }
        for _ in 0..30 {
            slow.advance(true, 1.0 / 30.0, 0.0);
        }
        // Both simulate one second; discretization error stays small.
        assert!((fast.progress() - slow.progress()).abs() < 0.05);
    }

    #[test]
    fn test_position_uses_eased_progress() {
        let mut engine = TransitionEngine::new(vec![moving(0)], params(InstanceShape::Box));
        engine.set_progress(0.25);
        // elapsed + phase = 0 removes the float term
        let pos = engine.position_at(0, 0.0).unwrap();
        let expected = -10.0 + 20.0 * ease_in_out_cubic(0.25);
        assert!((pos.x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_float_amplitude_shrinks_in_tree() {
        let mut engine = TransitionEngine::new(vec![moving(0)], params(InstanceShape::Box));
        let t = std::f32::consts::FRAC_PI_2;
        engine.set_progress(0.0);
        assert!((engine.position_at(0, t).unwrap().y - 0.2).abs() < 1e-5);
        engine.set_progress(1.0);
        assert!((engine.position_at(0, t).unwrap().y - 0.02).abs() < 1e-5);
    }

    #[test]
    fn test_active_particle_has_zero_scale() {
        let engine = TransitionEngine::new(vec![moving(0), moving(1)], params(InstanceShape::Box));
        let mut out = Vec::new();
        engine.write_transforms(&[0, 1], 1.0, Some(1), &mut out);
        assert!((out[0].uniform_scale() - 0.8).abs() < 1e-5);
        assert_eq!(out[1].uniform_scale(), 0.0);
    }

    #[test]
    fn test_spheres_do_not_spin() {
        let mut p = moving(0);
        p.rotation_speed = 1.0;
        let engine = TransitionEngine::new(vec![p.clone()], params(InstanceShape::Sphere));
        assert_eq!(engine.pose(&p, 5.0, false).rotation, Vec3::ZERO);
        let engine = TransitionEngine::new(vec![p.clone()], params(InstanceShape::Box));
        let rot = engine.pose(&p, 5.0, false).rotation;
        assert!((rot.x - 1.0).abs() < 1e-6 && (rot.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_translation_matches_position() {
        let engine = TransitionEngine::new(vec![moving(0)], params(InstanceShape::Box));
        let mut out = Vec::new();
        engine.write_transforms(&[0], 0.7, None, &mut out);
        let pos = engine.position_at(0, 0.7).unwrap();
        assert!((out[0].translation() - pos).length() < 1e-5);
    }

    #[test]
    fn test_slot_map_partitions_by_category() {
        let particles = vec![
            Particle::fixed(0, Vec3::ZERO, Gift),
            Particle::fixed(1, Vec3::ZERO, Decorative),
            Particle::fixed(2, Vec3::ZERO, Gift),
        ];
        let map = SlotMap::build(&particles, true);
        assert_eq!(map.ids(SubMesh::Gift), &[0, 2]);
        assert_eq!(map.ids(SubMesh::Decorative), &[1]);
        assert_eq!(map.particle_at(SubMesh::Gift, 1), Some(2));
        assert_eq!(map.slot_of(1), Some((SubMesh::Decorative, 0)));
    }

    #[test]
    fn test_slot_map_unpartitioned_is_identity() {
        let particles: Vec<_> = (0..4).map(|i| Particle::fixed(i, Vec3::ZERO, Gift)).collect();
        let map = SlotMap::build(&particles, false);
        assert_eq!(map.sub_meshes(), &[SubMesh::All]);
        assert_eq!(map.slot_of(3), Some((SubMesh::All, 3)));
    }

    #[test]
    fn test_slot_map_rebuild_only_on_change() {
        let mut particles = vec![
            Particle::fixed(0, Vec3::ZERO, Gift),
            Particle::fixed(1, Vec3::ZERO, Decorative),
        ];
        let mut map = SlotMap::build(&particles, true);
        assert!(!map.rebuild_if_changed(&particles));
        particles[1].category = Gift;
        assert!(map.rebuild_if_changed(&particles));
        assert_eq!(map.ids(SubMesh::Gift), &[0, 1]);
    }
}
