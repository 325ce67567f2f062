//! Rendering delegate interface.
//!
//! The scene never draws anything itself. Each frame it hands a
//! [`RenderDelegate`] a list of instanced batches (one per ornament sub-mesh,
//! plus star and snow), the foliage uniforms, and the spiral point sprites.
//! The `viewer` feature provides a wgpu implementation; [`RecordingDelegate`]
//! keeps the last frame in memory for tests and headless runs.

use crate::foliage::FoliageUniforms;
use crate::transition::{InstanceTransform, SubMesh};
use crate::Vec3;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Base geometry of an instanced batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cube,
    Sphere,
    /// Tree star.
    Octahedron,
    /// Snowflake.
    Flake,
}

/// Surface parameters of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialRef {
    pub metalness: f32,
    pub roughness: f32,
    /// Added light, `0` for plain ornaments.
    pub emissive: f32,
}

impl MaterialRef {
    pub const ORNAMENT: Self = Self {
        metalness: 0.6,
        roughness: 0.25,
        emissive: 0.0,
    };
    pub const STAR: Self = Self {
        metalness: 1.0,
        roughness: 0.1,
        emissive: 2.0,
    };
    pub const SNOW: Self = Self {
        metalness: 0.0,
        roughness: 0.9,
        emissive: 0.5,
    };
}

/// Per-instance color, uploaded next to the transforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceColor {
    pub rgb: [f32; 3],
    pub _pad: f32,
}

impl InstanceColor {
    pub fn new(color: Vec3) -> Self {
        Self {
            rgb: color.to_array(),
            _pad: 0.0,
        }
    }
}

/// One camera-facing point (spiral particles).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointSprite {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

/// Identifies a batch across frames so a delegate can keep its buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKey {
    /// Sub-mesh of ornament group `group`.
    Ornament { group: usize, mesh: SubMesh },
    Star,
    Snow,
}

/// One instanced draw.
#[derive(Debug, Clone, Copy)]
pub struct InstanceBatch<'a> {
    pub key: BatchKey,
    pub mesh: MeshKind,
    pub material: MaterialRef,
    /// `transforms[slot]` is the instance drawn at `slot`.
    pub transforms: &'a [InstanceTransform],
    /// Same length as `transforms`.
    pub colors: &'a [InstanceColor],
    /// Bumped whenever `colors` changes, so they can be uploaded lazily.
    pub colors_revision: u64,
    /// Whether the batch lives inside the rotating tree group.
    pub in_group: bool,
}

/// Per-frame view state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    /// Offset and Y rotation of the tree group.
    pub group_transform: Mat4,
    pub viewer: Vec3,
    pub elapsed: f32,
}

/// Rendering collaborator.
pub trait RenderDelegate {
    fn begin_frame(&mut self, view: &FrameView);
    fn draw_instances(&mut self, batch: &InstanceBatch<'_>);
    /// Foliage uses static attributes uploaded once, so only uniforms flow
    /// per frame. `view_proj` in `uniforms` is filled in by the delegate.
    fn draw_foliage(&mut self, uniforms: &FoliageUniforms);
    fn draw_points(&mut self, points: &[PointSprite]);
    fn end_frame(&mut self) {}
}

/// Owned copy of an [`InstanceBatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub key: BatchKey,
    pub mesh: MeshKind,
    pub material: MaterialRef,
    pub transforms: Vec<InstanceTransform>,
    pub colors: Vec<InstanceColor>,
    pub in_group: bool,
}

/// Delegate that keeps the most recent frame.
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    pub view: Option<FrameView>,
    pub batches: Vec<RecordedBatch>,
    pub foliage: Option<FoliageUniforms>,
    pub points: Vec<PointSprite>,
    pub frames: u64,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(&self, key: BatchKey) -> Option<&RecordedBatch> {
        self.batches.iter().find(|b| b.key == key)
    }

    /// Total instances submitted in the last frame.
    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(|b| b.transforms.len()).sum()
    }
}

impl RenderDelegate for RecordingDelegate {
    fn begin_frame(&mut self, view: &FrameView) {
        self.view = Some(*view);
        self.batches.clear();
        self.foliage = None;
        self.points.clear();
    }

    fn draw_instances(&mut self, batch: &InstanceBatch<'_>) {
        self.batches.push(RecordedBatch {
            key: batch.key,
            mesh: batch.mesh,
            material: batch.material,
            transforms: batch.transforms.to_vec(),
            colors: batch.colors.to_vec(),
            in_group: batch.in_group,
        });
    }

    fn draw_foliage(&mut self, uniforms: &FoliageUniforms) {
        self.foliage = Some(*uniforms);
    }

    fn draw_points(&mut self, points: &[PointSprite]) {
        self.points.extend_from_slice(points);
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}
