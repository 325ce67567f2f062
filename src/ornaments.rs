//! Instanced ornament groups.
//!
//! An [`OrnamentGroup`] ties together the particles of one mesh type, their
//! [`TransitionEngine`], the group's [`Selection`] and the memory collection
//! the gifts reveal. Memories are bound by particle id (`id % len`) at lookup
//! time, so swapping the collection never touches the particle layout.
//!
//! Callers outside the frame loop control a group through an
//! [`OrnamentHandle`]: commands are queued on a channel and applied at the
//! start of the next [`OrnamentGroup::update`].

use crate::config::{OrnamentGroupConfig, SceneConfig};
use crate::effects::GiftReveal;
use crate::error::ConfigError;
use crate::memory::Memory;
use crate::particle::{self, Particle};
use crate::render::{BatchKey, InstanceBatch, InstanceColor, MaterialRef, MeshKind};
use crate::selection::{Selection, SelectionEvent};
use crate::spawn::SpawnContext;
use crate::transition::{InstanceShape, InstanceTransform, SlotMap, SubMesh, TransitionEngine, TransitionParams};
use crate::Vec3;
use glam::Mat4;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::debug;

/// Control message for a group, sent through an [`OrnamentHandle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrnamentCommand {
    /// Open the gift closest to `viewer`.
    OpenNearest { viewer: Vec3 },
    /// Close the opened gift, if any.
    CloseActive,
}

/// Cloneable sender side of a group's command queue.
#[derive(Debug, Clone)]
pub struct OrnamentHandle {
    tx: Sender<OrnamentCommand>,
}

impl OrnamentHandle {
    /// Queue a command. Returns `false` once the group is gone.
    pub fn send(&self, command: OrnamentCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn open_nearest(&self, viewer: Vec3) -> bool {
        self.send(OrnamentCommand::OpenNearest { viewer })
    }

    pub fn close_active(&self) -> bool {
        self.send(OrnamentCommand::CloseActive)
    }
}

/// Frame inputs shared by every group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupFrame {
    pub tree_shape: bool,
    pub dt: f32,
    pub elapsed: f32,
    /// Group-to-world transform (tree offset and rotation).
    pub group_transform: Mat4,
    /// Another group already has an opened gift; opening is refused.
    pub locked: bool,
}

/// Result of a ray hitting an ornament.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub mesh: SubMesh,
    pub slot: usize,
    pub particle_id: u32,
    /// Distance along the ray.
    pub distance: f32,
}

/// One instanced ornament group.
#[derive(Debug)]
pub struct OrnamentGroup {
    name: String,
    engine: TransitionEngine,
    slots: SlotMap,
    selection: Selection,
    memories: Vec<Arc<Memory>>,
    reveal: Option<GiftReveal>,
    base_color: Vec3,
    transforms: HashMap<SubMesh, Vec<InstanceTransform>>,
    colors: HashMap<SubMesh, Vec<InstanceColor>>,
    colors_revision: u64,
    commands: Receiver<OrnamentCommand>,
    handle: Sender<OrnamentCommand>,
}

impl OrnamentGroup {
    /// Wrap pre-built particles. Box groups with gifts get separate gift and
    /// decoration sub-meshes.
    pub fn new(name: impl Into<String>, particles: Vec<Particle>, params: TransitionParams, base_color: Vec3) -> Self {
        let partitioned = params.shape == InstanceShape::Box && particles.iter().any(Particle::is_gift);
        let slots = SlotMap::build(&particles, partitioned);
        let (handle, commands) = mpsc::channel();
        let mut group = Self {
            name: name.into(),
            engine: TransitionEngine::new(particles, params),
            slots,
            selection: Selection::Idle,
            memories: Vec::new(),
            reveal: None,
            base_color,
            transforms: HashMap::new(),
            colors: HashMap::new(),
            colors_revision: 0,
            commands,
            handle,
        };
        group.rebuild_colors();
        group
    }

    /// Generate a group from its configuration.
    pub fn from_config(
        config: &SceneConfig,
        group: &OrnamentGroupConfig,
        ctx: &mut SpawnContext,
    ) -> Result<Self, ConfigError> {
        let layout = config.group_layout(group)?;
        let particles = particle::generate(group.count, &layout, ctx);
        Ok(Self::new(
            group.name.clone(),
            particles,
            config.transition_params(group),
            layout.base_color,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> OrnamentHandle {
        OrnamentHandle {
            tx: self.handle.clone(),
        }
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn reveal(&self) -> Option<&GiftReveal> {
        self.reveal.as_ref()
    }

    pub fn shape(&self) -> InstanceShape {
        self.engine.params().shape
    }

    pub fn gift_count(&self) -> usize {
        self.engine.particles().iter().filter(|p| p.is_gift()).count()
    }

    /// Rebind the memory collection. Particle layout is untouched.
    pub fn set_memories(&mut self, memories: Vec<Arc<Memory>>) {
        self.memories = memories;
        if self.slots.rebuild_if_changed(self.engine.particles()) {
            debug!(group = %self.name, "Slot map rebuilt");
            self.rebuild_colors();
        }
    }

    /// Memory revealed by particle `id`: `memories[id % len]`.
    pub fn assigned_memory(&self, id: u32) -> Option<Arc<Memory>> {
        if self.memories.is_empty() {
            return None;
        }
        self.memories.get(id as usize % self.memories.len()).cloned()
    }

    /// World position of particle `id` as drawn in the last frame.
    pub fn world_position(&self, id: u32, group_transform: Mat4) -> Option<Vec3> {
        self.engine
            .current_position(id)
            .map(|p| group_transform.transform_point3(p))
    }

    /// Open particle `id` at `world_position`.
    pub fn activate(&mut self, id: u32, world_position: Vec3) -> Option<SelectionEvent> {
        let memory = self.assigned_memory(id);
        let event = self.selection.activate(id, world_position, memory)?;
        self.reveal = Some(GiftReveal::new(world_position));
        debug!(group = %self.name, particle = id, "Gift opened");
        Some(event)
    }

    pub fn close(&mut self) -> Option<SelectionEvent> {
        let event = self.selection.close()?;
        self.reveal = None;
        debug!(group = %self.name, "Gift closed");
        Some(event)
    }

    fn gift_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.engine
            .particles()
            .iter()
            .filter(|p| p.is_gift())
            .map(|p| p.id)
    }

    /// Gift with a memory whose current position is closest to `viewer`.
    pub fn nearest_gift(&self, viewer: Vec3, group_transform: Mat4) -> Option<(u32, Vec3)> {
        self.gift_ids()
            .filter(|&id| self.assigned_memory(id).is_some())
            .filter_map(|id| self.world_position(id, group_transform).map(|pos| (id, pos)))
            .min_by(|a, b| a.1.distance_squared(viewer).total_cmp(&b.1.distance_squared(viewer)))
    }

    /// Open the gift nearest to `viewer`. Box groups only; no-op while a
    /// gift is open.
    pub fn open_nearest(&mut self, viewer: Vec3, group_transform: Mat4) -> Option<SelectionEvent> {
        if self.selection.is_active() || self.shape() != InstanceShape::Box {
            return None;
        }
        let (id, position) = self.nearest_gift(viewer, group_transform)?;
        self.activate(id, position)
    }

    /// Click on instance `slot` of `mesh`. Only gifts open.
    pub fn click(&mut self, mesh: SubMesh, slot: usize, group_transform: Mat4) -> Option<SelectionEvent> {
        let id = self.slots.particle_at(mesh, slot)?;
        if !self.engine.particle(id).is_some_and(Particle::is_gift) {
            return None;
        }
        let position = self.world_position(id, group_transform)?;
        self.activate(id, position)
    }

    /// Closest visible instance hit by a world-space ray.
    pub fn pick(&self, origin: Vec3, direction: Vec3, group_transform: Mat4) -> Option<PickHit> {
        let direction = direction.normalize_or_zero();
        let active = self.selection.active_id();
        let elapsed = self.engine.elapsed();
        let mut best: Option<PickHit> = None;
        for &mesh in self.slots.sub_meshes() {
            for (slot, &id) in self.slots.ids(mesh).iter().enumerate() {
                if active == Some(id) {
                    continue;
                }
                let Some(p) = self.engine.particle(id) else { continue };
                let pose = self.engine.pose(p, elapsed, false);
                let center = group_transform.transform_point3(pose.position);
                // Bounding sphere of a unit cube or sphere mesh.
                let radius = pose.scale * 0.75;
                if let Some(distance) = ray_sphere(origin, direction, center, radius) {
                    if best.map_or(true, |b| distance < b.distance) {
                        best = Some(PickHit {
                            mesh,
                            slot,
                            particle_id: id,
                            distance,
                        });
                    }
                }
            }
        }
        best
    }

    fn apply(&mut self, command: OrnamentCommand, frame: &GroupFrame) -> Option<SelectionEvent> {
        match command {
            OrnamentCommand::OpenNearest { .. } if frame.locked || frame.tree_shape => None,
            OrnamentCommand::OpenNearest { viewer } => self.open_nearest(viewer, frame.group_transform),
            OrnamentCommand::CloseActive => self.close(),
        }
    }

    /// Apply queued commands against the pose drawn last frame. An open
    /// request is dropped while the tree is formed or another group is open.
    pub fn apply_commands(&mut self, frame: &GroupFrame) -> Vec<SelectionEvent> {
        let mut events = Vec::new();
        let mut frame = *frame;
        while let Ok(command) = self.commands.try_recv() {
            if let Some(event) = self.apply(command, &frame) {
                frame.locked |= self.selection.is_active();
                events.push(event);
            }
        }
        events
    }

    /// Apply queued commands, advance the transition and refresh instance
    /// buffers. Returns the selection events the commands produced.
    pub fn update(&mut self, frame: &GroupFrame) -> Vec<SelectionEvent> {
        let events = self.apply_commands(frame);

        self.engine.advance(frame.tree_shape, frame.dt, frame.elapsed);
        if let Some(reveal) = &mut self.reveal {
            reveal.update(frame.dt);
        }

        let active = self.selection.active_id();
        for &mesh in self.slots.sub_meshes() {
            let out = self.transforms.entry(mesh).or_default();
            self.engine
                .write_transforms(self.slots.ids(mesh), frame.elapsed, active, out);
        }
        events
    }

    /// Transforms of `mesh` from the last update.
    pub fn transforms(&self, mesh: SubMesh) -> &[InstanceTransform] {
        self.transforms.get(&mesh).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn colors(&self, mesh: SubMesh) -> &[InstanceColor] {
        self.colors.get(&mesh).map(Vec::as_slice).unwrap_or(&[])
    }

    fn rebuild_colors(&mut self) {
        self.colors.clear();
        for &mesh in self.slots.sub_meshes() {
            let colors = self
                .slots
                .ids(mesh)
                .iter()
                .map(|&id| match self.engine.particle(id) {
                    Some(p) if p.is_gift() => InstanceColor::new(p.color),
                    _ => InstanceColor::new(self.base_color),
                })
                .collect();
            self.colors.insert(mesh, colors);
        }
        self.colors_revision += 1;
    }

    /// Draw batches for the last update, one per sub-mesh.
    pub fn batches(&self, group_index: usize) -> Vec<InstanceBatch<'_>> {
        let mesh_kind = match self.shape() {
            InstanceShape::Box => MeshKind::Cube,
            InstanceShape::Sphere => MeshKind::Sphere,
        };
        self.slots
            .sub_meshes()
            .iter()
            .map(|&mesh| InstanceBatch {
                key: BatchKey::Ornament {
                    group: group_index,
                    mesh,
                },
                mesh: mesh_kind,
                material: MaterialRef::ORNAMENT,
                transforms: self.transforms(mesh),
                colors: self.colors(mesh),
                colors_revision: self.colors_revision,
                in_group: true,
            })
            .collect()
    }
}

/// Distance along a normalized ray to the first hit with a sphere.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    if radius <= 0.0 {
        return None;
    }
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let near = -b - sqrt;
    let far = -b + sqrt;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(0.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryId;
    use crate::particle::ParticleCategory::{Decorative, Gift};

    fn params(shape: InstanceShape) -> TransitionParams {
        TransitionParams {
            smoothing_rate: 2.0,
            scale_base: 0.8,
            shape,
        }
    }

    fn memories(n: u64) -> Vec<Arc<Memory>> {
        (0..n)
            .map(|i| {
                Arc::new(Memory {
                    id: MemoryId::from(i),
                    name: format!("m{i}"),
                    photo: "data:image/png;base64,AA".into(),
                    music: None,
                })
            })
            .collect()
    }

    fn frame() -> GroupFrame {
        GroupFrame {
            tree_shape: false,
            dt: 1.0 / 60.0,
            elapsed: 0.0,
            group_transform: Mat4::IDENTITY,
            locked: false,
        }
    }

    /// Gifts at distance 5, 2 and 8 from the origin plus one decoration at 1.
    fn distance_group() -> OrnamentGroup {
        let particles = vec![
            Particle::fixed(0, Vec3::new(0.0, 0.0, 5.0), Gift),
            Particle::fixed(1, Vec3::new(0.0, 0.0, 2.0), Gift),
            Particle::fixed(2, Vec3::new(0.0, 0.0, 8.0), Gift),
            Particle::fixed(3, Vec3::new(0.0, 0.0, 1.0), Decorative),
        ];
        OrnamentGroup::new("test", particles, params(InstanceShape::Box), Vec3::ONE)
    }

    #[test]
    fn test_open_nearest_picks_closest_gift() {
        let mut group = distance_group();
        group.set_memories(memories(2));
        let event = group.open_nearest(Vec3::ZERO, Mat4::IDENTITY);
        assert!(matches!(event, Some(SelectionEvent::Opened { .. })));
        assert_eq!(group.selection().active_id(), Some(1));
        assert!(group.reveal().is_some());
    }

    #[test]
    fn test_open_nearest_needs_memories() {
        let mut group = distance_group();
        assert_eq!(group.open_nearest(Vec3::ZERO, Mat4::IDENTITY), None);
        assert!(!group.selection().is_active());
    }

    #[test]
    fn test_open_nearest_uses_group_transform() {
        let mut group = distance_group();
        group.set_memories(memories(1));
        // Shifting the group by -6 on Z puts particle 0 (z=5) closest to the origin.
        let shifted = Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0));
        group.open_nearest(Vec3::ZERO, shifted);
        assert_eq!(group.selection().active_id(), Some(0));
        assert_eq!(group.selection().active_position(), Some(Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_sphere_groups_never_open() {
        let particles = vec![Particle::fixed(0, Vec3::ZERO, Gift)];
        let mut group = OrnamentGroup::new("s", particles, params(InstanceShape::Sphere), Vec3::ONE);
        group.set_memories(memories(1));
        assert_eq!(group.open_nearest(Vec3::ZERO, Mat4::IDENTITY), None);
    }

    #[test]
    fn test_assigned_memory_wraps() {
        let mut group = distance_group();
        group.set_memories(memories(3));
        assert_eq!(group.assigned_memory(1).unwrap().name, "m1");
        assert_eq!(group.assigned_memory(3).unwrap().name, "m0");
    }

    #[test]
    fn test_click_ignores_decorations() {
        let mut group = distance_group();
        group.set_memories(memories(1));
        assert_eq!(group.click(SubMesh::Decorative, 0, Mat4::IDENTITY), None);
        assert!(group.click(SubMesh::Gift, 2, Mat4::IDENTITY).is_some());
        assert_eq!(group.selection().active_id(), Some(2));
    }

    #[test]
    fn test_commands_apply_on_update() {
        let mut group = distance_group();
        group.set_memories(memories(1));
        let handle = group.handle();
        assert!(handle.open_nearest(Vec3::ZERO));
        assert!(!group.selection().is_active());

        let events = group.update(&frame());
        assert_eq!(events.len(), 1);
        assert_eq!(group.selection().active_id(), Some(1));
        // The opened gift is drawn with zero scale.
        let slot = group.slots().slot_of(1).unwrap();
        assert_eq!(group.transforms(slot.0)[slot.1].uniform_scale(), 0.0);

        handle.close_active();
        assert_eq!(group.update(&frame()), vec![SelectionEvent::Closed]);
        assert!(group.reveal().is_none());
    }

    #[test]
    fn test_locked_group_refuses_to_open() {
        let mut group = distance_group();
        group.set_memories(memories(1));
        group.handle().open_nearest(Vec3::ZERO);
        let events = group.update(&GroupFrame {
            locked: true,
            ..frame()
        });
        assert!(events.is_empty());
        assert!(!group.selection().is_active());
    }

    #[test]
    fn test_queued_open_dropped_once_tree_forms() {
        let mut group = distance_group();
        group.set_memories(memories(1));
        group.handle().open_nearest(Vec3::ZERO);
        let events = group.apply_commands(&GroupFrame {
            tree_shape: true,
            ..frame()
        });
        assert!(events.is_empty());
        assert!(!group.selection().is_active());
    }

    #[test]
    fn test_batches_follow_partition() {
        let mut group = distance_group();
        group.update(&frame());
        let batches = group.batches(0);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].transforms.len(), 3);
        assert_eq!(batches[1].transforms.len(), 1);
        assert_eq!(batches[0].colors.len(), 3);
    }

    #[test]
    fn test_memory_swap_keeps_layout() {
        let mut ctx = SpawnContext::seeded(5);
        let config = SceneConfig::default();
        let mut group = OrnamentGroup::from_config(&config, &config.ornaments.groups[0], &mut ctx).unwrap();
        let before = group.engine().particles().to_vec();
        let slots = group.slots().clone();
        group.set_memories(memories(4));
        group.set_memories(memories(1));
        group.set_memories(Vec::new());
        assert_eq!(group.engine().particles(), before.as_slice());
        assert_eq!(group.slots(), &slots);
    }

    #[test]
    fn test_pick_hits_front_instance() {
        let mut group = distance_group();
        group.update(&frame());
        let hit = group
            .pick(Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z, Mat4::IDENTITY)
            .unwrap();
        assert_eq!(hit.particle_id, 2);
        assert_eq!(hit.mesh, SubMesh::Gift);
        assert!(group.pick(Vec3::new(5.0, 0.0, 20.0), Vec3::NEG_Z, Mat4::IDENTITY).is_none());
    }
}
