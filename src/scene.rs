//! Scene orchestration.
//!
//! [`Scene`] owns every animated subsystem and the single [`SceneMode`]. The
//! gesture mapper and the ornament groups never talk to each other directly:
//! gestures become [`SceneAction`]s that change the mode or are forwarded as
//! [`OrnamentCommand`](crate::ornaments::OrnamentCommand)s, and each frame
//! the groups read the mode back.
//!
//! A frame is two calls:
//!
//! ```ignore
//! scene.frame(time.delta(), time.elapsed());
//! scene.render(&mut delegate);
//! ```

use crate::audio::{play_or_stop, AudioPlayback};
use crate::config::SceneConfig;
use crate::easing::approach;
use crate::effects::{Snowfall, SpiralCloud, TreeStar};
use crate::error::ConfigError;
use crate::foliage::FoliageCloud;
use crate::gesture::{GestureFrame, GestureMapper, MapperContext, SceneAction};
use crate::memory::Memory;
use crate::ornaments::{GroupFrame, OrnamentGroup, PickHit};
use crate::render::{
    BatchKey, FrameView, InstanceBatch, InstanceColor, MaterialRef, MeshKind, PointSprite, RenderDelegate,
};
use crate::selection::{ActiveItem, SelectionEvent};
use crate::spawn::{hex_color, SpawnContext};
use crate::transition::{InstanceTransform, SubMesh};
use crate::Vec3;
use glam::Mat4;
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide mode shared by every group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneMode {
    pub tree_shape: bool,
    /// Rotation the group eases toward.
    pub target_rotation_y: f32,
    /// Current group rotation.
    pub rotation_y: f32,
}

/// The whole tree: foliage, ornament groups, effects and interaction state.
pub struct Scene<A: AudioPlayback> {
    config: SceneConfig,
    mode: SceneMode,
    foliage: FoliageCloud,
    groups: Vec<OrnamentGroup>,
    spiral: SpiralCloud,
    star: TreeStar,
    snow: Snowfall,
    mapper: GestureMapper,
    audio: A,
    viewer: Vec3,
    elapsed: f32,
    /// An open request is queued and has not reached the groups yet.
    open_queued: bool,
    star_transform: [InstanceTransform; 1],
    star_color: [InstanceColor; 1],
    snow_transforms: Vec<InstanceTransform>,
    snow_colors: Vec<InstanceColor>,
    sprites: Vec<PointSprite>,
}

impl<A: AudioPlayback> Scene<A> {
    /// Generate every particle set from `config`.
    pub fn new(config: SceneConfig, audio: A) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut ctx = SpawnContext::new(config.seed);
        let foliage = FoliageCloud::generate(config.foliage_params(), &mut ctx);
        let groups = config
            .ornaments
            .groups
            .iter()
            .map(|group| OrnamentGroup::from_config(&config, group, &mut ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let spiral = SpiralCloud::generate(
            config.effects.spiral_count,
            config.tree.height,
            config.tree.radius,
            &mut ctx,
        );
        let snow = Snowfall::generate(
            config.effects.snow_count,
            config.effects.snow_area,
            config.effects.snow_speed,
            ctx.fork(),
        );
        info!(
            foliage = foliage.len(),
            groups = groups.len(),
            ornaments = groups.iter().map(|g| g.engine().len()).sum::<usize>(),
            "Scene generated"
        );
        Ok(Self {
            mapper: GestureMapper::new(&config.gesture),
            viewer: config.camera_position(),
            mode: SceneMode::default(),
            foliage,
            groups,
            spiral,
            star: TreeStar::default(),
            snow_colors: vec![InstanceColor::new(Vec3::ONE); snow.len()],
            snow,
            audio,
            elapsed: 0.0,
            open_queued: false,
            star_transform: [InstanceTransform::from_mat4(Mat4::ZERO)],
            star_color: [InstanceColor::new(hex_color(TreeStar::COLOR))],
            snow_transforms: Vec::new(),
            sprites: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn mode(&self) -> &SceneMode {
        &self.mode
    }

    pub fn is_tree_shape(&self) -> bool {
        self.mode.tree_shape
    }

    pub fn set_tree_shape(&mut self, tree_shape: bool) {
        if self.mode.tree_shape != tree_shape {
            debug!(tree_shape, "Scene mode changed");
        }
        self.mode.tree_shape = tree_shape;
    }

    /// The summon/scatter button.
    pub fn toggle_tree_shape(&mut self) {
        self.set_tree_shape(!self.mode.tree_shape);
    }

    /// The camera orbits on its own once the tree has formed.
    pub fn auto_rotate(&self) -> bool {
        self.mode.tree_shape
    }

    /// Ornament progress of the first group, foliage if there are none.
    pub fn progress(&self) -> f32 {
        self.groups
            .first()
            .map(|g| g.engine().progress())
            .unwrap_or_else(|| self.foliage.progress())
    }

    pub fn foliage(&self) -> &FoliageCloud {
        &self.foliage
    }

    pub fn groups(&self) -> &[OrnamentGroup] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&OrnamentGroup> {
        self.groups.get(index)
    }

    pub fn star(&self) -> &TreeStar {
        &self.star
    }

    pub fn spiral(&self) -> &SpiralCloud {
        &self.spiral
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn viewer(&self) -> Vec3 {
        self.viewer
    }

    /// Camera position used for nearest-gift selection.
    pub fn set_viewer(&mut self, viewer: Vec3) {
        self.viewer = viewer;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Offset and rotation of the tree group.
    pub fn group_transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, self.config.tree.group_offset_y, 0.0))
            * Mat4::from_rotation_y(self.mode.rotation_y)
    }

    pub fn any_active(&self) -> bool {
        self.groups.iter().any(|g| g.selection().is_active())
    }

    /// The opened gift and the index of its group.
    pub fn active(&self) -> Option<(usize, &ActiveItem)> {
        self.groups
            .iter()
            .enumerate()
            .find_map(|(i, g)| g.selection().active().map(|item| (i, item)))
    }

    /// Rebind every group to a new memory collection.
    pub fn set_memories(&mut self, memories: &[Memory]) {
        let shared: Vec<Arc<Memory>> = memories.iter().cloned().map(Arc::new).collect();
        for group in &mut self.groups {
            group.set_memories(shared.clone());
        }
        debug!(count = shared.len(), "Memories bound to ornaments");
    }

    /// Feed one gesture frame through the mapper and apply its actions.
    pub fn apply_gesture(&mut self, frame: &GestureFrame) -> Vec<SceneAction> {
        let ctx = MapperContext {
            tree_shape: self.mode.tree_shape,
            has_active: self.any_active() || self.open_queued,
        };
        let actions = self.mapper.process(frame, ctx);
        for &action in &actions {
            self.apply(action);
        }
        actions
    }

    /// Apply one action. Open/close requests are queued for the next frame.
    pub fn apply(&mut self, action: SceneAction) {
        match action {
            SceneAction::Rotate(rotation) => self.mode.target_rotation_y = rotation,
            SceneAction::Summon => self.set_tree_shape(true),
            SceneAction::Scatter => self.set_tree_shape(false),
            SceneAction::CloseActive => {
                self.open_queued = false;
                for group in &self.groups {
                    group.handle().close_active();
                }
            }
            SceneAction::OpenNearest => {
                self.open_queued = true;
                for group in &self.groups {
                    group.handle().open_nearest(self.viewer);
                }
            }
        }
    }

    fn forward(&mut self, event: &SelectionEvent) {
        match event {
            SelectionEvent::Opened { music } => play_or_stop(&mut self.audio, music.as_deref()),
            SelectionEvent::Closed => self.audio.stop(),
        }
    }

    /// Click on instance `slot` of a group's sub-mesh. Refused while any
    /// gift is open.
    pub fn click(&mut self, group: usize, mesh: SubMesh, slot: usize) -> Option<SelectionEvent> {
        if self.any_active() {
            return None;
        }
        let transform = self.group_transform();
        let event = self.groups.get_mut(group)?.click(mesh, slot, transform)?;
        self.forward(&event);
        Some(event)
    }

    /// Closest ornament under a world-space ray, with its group index.
    pub fn pick(&self, origin: Vec3, direction: Vec3) -> Option<(usize, PickHit)> {
        let transform = self.group_transform();
        self.groups
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.pick(origin, direction, transform).map(|hit| (i, hit)))
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
    }

    /// Pick along a ray and click whatever was hit.
    pub fn click_ray(&mut self, origin: Vec3, direction: Vec3) -> Option<SelectionEvent> {
        let (group, hit) = self.pick(origin, direction)?;
        self.click(group, hit.mesh, hit.slot)
    }

    /// Close the opened gift right away.
    pub fn close_active(&mut self) -> Option<SelectionEvent> {
        let event = self.groups.iter_mut().find_map(OrnamentGroup::close)?;
        self.forward(&event);
        Some(event)
    }

    /// Advance every subsystem by `dt` seconds. Returns the selection events
    /// of queued commands, already forwarded to audio.
    pub fn frame(&mut self, dt: f32, elapsed: f32) -> Vec<SelectionEvent> {
        let tree_shape = self.mode.tree_shape;

        // Queued commands see the pose and rotation drawn last frame.
        let drawn_transform = self.group_transform();
        let mut events = Vec::new();
        let mut locked = self.any_active();
        for group in &mut self.groups {
            let was_active = group.selection().is_active();
            let frame = GroupFrame {
                tree_shape,
                dt,
                elapsed,
                group_transform: drawn_transform,
                locked: locked && !was_active,
            };
            events.extend(group.apply_commands(&frame));
            locked |= group.selection().is_active();
        }
        self.open_queued = false;

        self.elapsed = elapsed;
        self.mode.rotation_y = approach(
            self.mode.rotation_y,
            self.mode.target_rotation_y,
            self.config.tree.rotation_rate,
            dt,
        );
        self.foliage.update(tree_shape, dt, elapsed);

        let group_transform = self.group_transform();
        for group in &mut self.groups {
            let frame = GroupFrame {
                tree_shape,
                dt,
                elapsed,
                group_transform,
                locked: true,
            };
            events.extend(group.update(&frame));
        }
        for event in &events {
            self.forward(event);
        }

        self.spiral.update(tree_shape, dt);
        self.spiral.write_sprites(elapsed, &mut self.sprites);
        self.star.update(tree_shape, elapsed);
        self.star_transform[0] = self.star.transform();
        self.snow.update(dt);
        self.snow.write_transforms(&mut self.snow_transforms);
        events
    }

    /// Submit the last computed frame to `delegate`.
    pub fn render(&self, delegate: &mut dyn RenderDelegate) {
        delegate.begin_frame(&FrameView {
            group_transform: self.group_transform(),
            viewer: self.viewer,
            elapsed: self.elapsed,
        });
        delegate.draw_foliage(&self.foliage.uniforms(Mat4::IDENTITY, (1, 1)));
        for (i, group) in self.groups.iter().enumerate() {
            for batch in group.batches(i) {
                delegate.draw_instances(&batch);
            }
        }
        delegate.draw_instances(&InstanceBatch {
            key: BatchKey::Star,
            mesh: MeshKind::Octahedron,
            material: MaterialRef::STAR,
            transforms: &self.star_transform,
            colors: &self.star_color,
            colors_revision: 0,
            in_group: true,
        });
        delegate.draw_instances(&InstanceBatch {
            key: BatchKey::Snow,
            mesh: MeshKind::Flake,
            material: MaterialRef::SNOW,
            transforms: &self.snow_transforms,
            colors: &self.snow_colors,
            colors_revision: 0,
            in_group: true,
        });
        if !self.sprites.is_empty() {
            delegate.draw_points(&self.sprites);
        }
        delegate.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PlaybackCall, RecordingPlayback};
    use crate::gesture::GestureLabel;
    use crate::memory::MemoryId;
    use crate::render::RecordingDelegate;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig {
            seed: Some(7),
            ..Default::default()
        };
        config.foliage.count = 200;
        config.effects.spiral_count = 20;
        config.effects.snow_count = 20;
        config
    }

    fn memory(id: u64, music: &str) -> Memory {
        Memory {
            id: MemoryId::from(id),
            name: format!("m{id}"),
            photo: "data:image/png;base64,AA".into(),
            music: Some(music.to_string()).filter(|m| !m.is_empty()),
        }
    }

    fn run(scene: &mut Scene<RecordingPlayback>, seconds: f32) {
        let dt = 1.0 / 60.0;
        let start = scene.elapsed();
        for i in 1..=(seconds * 60.0) as usize {
            scene.frame(dt, start + i as f32 * dt);
        }
    }

    #[test]
    fn test_fist_forms_tree() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.apply_gesture(&GestureFrame::new(0, GestureLabel::ClosedFist));
        assert!(scene.is_tree_shape());
        assert!(scene.auto_rotate());
        run(&mut scene, 5.0);
        assert!(scene.progress() > 0.99);
        assert!(scene.foliage().progress() > 0.99);
        assert!(scene.star().scale > 0.99);
    }

    #[test]
    fn test_pinch_opens_and_palm_closes_with_music() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.set_memories(&[memory(1, "data:audio/mpeg;base64,AA")]);
        run(&mut scene, 0.1);

        let pinch = GestureFrame::new(0, GestureLabel::None).with_pinch(true);
        assert!(scene.apply_gesture(&pinch).contains(&SceneAction::OpenNearest));
        let events = scene.frame(1.0 / 60.0, 1.0);
        assert_eq!(events.len(), 1);
        assert!(scene.any_active());
        assert_eq!(scene.audio().now_playing(), Some("data:audio/mpeg;base64,AA"));

        let palm = GestureFrame::new(1500, GestureLabel::OpenPalm);
        assert!(scene.apply_gesture(&palm).contains(&SceneAction::CloseActive));
        scene.frame(1.0 / 60.0, 1.1);
        assert!(!scene.any_active());
        assert_eq!(scene.audio().calls.last(), Some(&PlaybackCall::Stop));
        // Closing does not also scatter.
        assert!(!scene.is_tree_shape());
    }

    #[test]
    fn test_fist_before_frame_cancels_pinch() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.set_memories(&[memory(1, "")]);
        run(&mut scene, 0.1);

        scene.apply_gesture(&GestureFrame::new(100, GestureLabel::None).with_pinch(true));
        let actions = scene.apply_gesture(&GestureFrame::new(110, GestureLabel::ClosedFist));
        assert!(actions.contains(&SceneAction::Summon));
        assert!(scene.frame(1.0 / 60.0, 1.0).is_empty());
        assert!(scene.is_tree_shape());
        assert!(!scene.any_active());
    }

    #[test]
    fn test_palm_before_frame_closes_instead_of_scattering() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.set_memories(&[memory(1, "data:audio/mpeg;base64,AA")]);
        run(&mut scene, 0.1);

        scene.apply_gesture(&GestureFrame::new(100, GestureLabel::None).with_pinch(true));
        let actions = scene.apply_gesture(&GestureFrame::new(110, GestureLabel::OpenPalm));
        assert!(actions.contains(&SceneAction::CloseActive));
        assert!(!actions.contains(&SceneAction::Scatter));

        let events = scene.frame(1.0 / 60.0, 1.0);
        assert!(matches!(events.last(), Some(SelectionEvent::Closed)));
        assert!(!scene.any_active());
        assert_eq!(scene.audio().calls.last(), Some(&PlaybackCall::Stop));
    }

    #[test]
    fn test_open_position_matches_drawn_rotation() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.set_memories(&[memory(1, "")]);
        run(&mut scene, 0.1);

        // Turn the group while scattered; rotation is still far from its target.
        scene.apply_gesture(&GestureFrame::new(0, GestureLabel::None).with_rotation(2.0));
        scene.frame(1.0 / 60.0, 0.2);
        let drawn = scene.group_transform();
        let viewer = scene.viewer();
        let (id, position) = scene.group(0).unwrap().nearest_gift(viewer, drawn).unwrap();

        scene.apply_gesture(&GestureFrame::new(50, GestureLabel::None).with_pinch(true).with_rotation(2.0));
        scene.frame(1.0 / 60.0, 0.2 + 1.0 / 60.0);
        let (_, item) = scene.active().unwrap();
        assert_eq!(item.particle_id, id);
        assert!(item.world_position.distance(position) < 1e-5);
    }

    #[test]
    fn test_rotation_eases_toward_target() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.apply_gesture(&GestureFrame::new(0, GestureLabel::None).with_rotation(1.0));
        assert_eq!(scene.mode().target_rotation_y, 1.0);
        run(&mut scene, 0.1);
        let partial = scene.mode().rotation_y;
        assert!(partial > 0.0 && partial < 1.0);
        run(&mut scene, 5.0);
        assert!((scene.mode().rotation_y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_render_submits_every_batch() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.toggle_tree_shape();
        run(&mut scene, 1.0);
        let mut delegate = RecordingDelegate::new();
        scene.render(&mut delegate);

        let ornaments: usize = scene.groups().iter().map(|g| g.engine().len()).sum();
        assert_eq!(delegate.instance_count(), ornaments + 1 + 20);
        assert!(delegate.foliage.is_some());
        assert_eq!(delegate.points.len(), 20);
        assert_eq!(delegate.frames, 1);
    }

    #[test]
    fn test_click_refused_while_open() {
        let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
        scene.set_memories(&[memory(1, "")]);
        run(&mut scene, 0.1);
        assert!(scene.click(0, SubMesh::Gift, 0).is_some());
        assert_eq!(scene.audio().calls, vec![PlaybackCall::Stop]);
        assert!(scene.click(0, SubMesh::Gift, 1).is_none());
        assert_eq!(scene.active().map(|(g, _)| g), Some(0));
        assert!(scene.close_active().is_some());
        assert!(!scene.any_active());
    }
}
