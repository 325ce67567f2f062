//! End-to-end scene behavior: scripted gestures, gift selection and the
//! memory binding, driven through the public API only.

use arix::audio::RecordingPlayback;
use arix::camera::Camera;
use arix::config::OrnamentGroupConfig;
use arix::gesture::GestureScript;
use arix::memory::{Memory, MemoryId};
use arix::render::{BatchKey, RecordingDelegate};
use arix::selection::SelectionEvent;
use arix::transition::{InstanceShape, SubMesh};
use arix::{GestureFrame, GestureLabel, Scene, SceneAction, SceneConfig, Time, Vec2, Vec3};

const DT: f32 = 1.0 / 60.0;

fn small_config() -> SceneConfig {
    let mut config = SceneConfig {
        seed: Some(42),
        ..Default::default()
    };
    config.foliage.count = 300;
    config.effects.spiral_count = 30;
    config.effects.snow_count = 30;
    config
}

fn gifts_only_config() -> SceneConfig {
    let mut config = small_config();
    config.ornaments.groups = vec![OrnamentGroupConfig {
        name: "gifts".into(),
        shape: InstanceShape::Box,
        count: 40,
        scale_base: 0.8,
        gift_ratio: 1.0,
        radius_factor: 0.9,
        color: "#8B0000".into(),
    }];
    config
}

fn memories(n: u64) -> Vec<Memory> {
    (0..n)
        .map(|i| Memory {
            id: MemoryId::from(i),
            name: format!("memory {i}"),
            photo: "data:image/png;base64,AA".into(),
            music: (i % 2 == 0).then(|| format!("data:audio/mpeg;base64,{i}")),
        })
        .collect()
}

/// Replay `script` for `frames` frames. Returns every action with its timestamp.
fn replay(
    scene: &mut Scene<RecordingPlayback>,
    script: &GestureScript,
    frames: u32,
) -> (Vec<(u64, SceneAction)>, Vec<SelectionEvent>) {
    let mut time = Time::simulated(DT);
    let mut last_ms = 0;
    let mut actions = Vec::new();
    let mut events = Vec::new();
    for _ in 0..frames {
        let (elapsed, dt) = time.update();
        let now_ms = time.elapsed_ms();
        for frame in script.window(last_ms, now_ms) {
            actions.extend(scene.apply_gesture(frame).into_iter().map(|a| (frame.timestamp_ms, a)));
        }
        last_ms = now_ms;
        events.extend(scene.frame(dt, elapsed));
    }
    (actions, events)
}

fn discrete(actions: &[(u64, SceneAction)]) -> Vec<(u64, SceneAction)> {
    actions
        .iter()
        .copied()
        .filter(|(_, a)| !matches!(a, SceneAction::Rotate(_)))
        .collect()
}

#[test]
fn test_fist_then_early_palm_is_debounced() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    let script = GestureScript {
        frames: vec![
            GestureFrame::new(0, GestureLabel::ClosedFist),
            GestureFrame::new(400, GestureLabel::OpenPalm),
            GestureFrame::new(1200, GestureLabel::OpenPalm),
        ],
    };
    let (actions, _) = replay(&mut scene, &script, 120);
    assert_eq!(
        discrete(&actions),
        vec![(0, SceneAction::Summon), (1200, SceneAction::Scatter)]
    );
    assert!(!scene.is_tree_shape());
}

#[test]
fn test_script_parses_from_json() {
    let json = r#"{"frames": [
        {"t_ms": 0, "label": "Closed_Fist"},
        {"t_ms": 50, "pinching": true, "rotation": 0.3}
    ]}"#;
    let script: GestureScript = serde_json::from_str(json).unwrap();
    assert_eq!(script.frames.len(), 2);
    assert_eq!(script.frames[0].label, GestureLabel::ClosedFist);
    assert!(script.frames[1].pinching);
    assert_eq!(script.frames[1].label, GestureLabel::None);
}

#[test]
fn test_tree_forms_and_scatters_back() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    scene.apply_gesture(&GestureFrame::new(0, GestureLabel::ClosedFist));
    let mut time = Time::simulated(DT);
    for _ in 0..300 {
        let (elapsed, dt) = time.update();
        scene.frame(dt, elapsed);
    }
    assert!(scene.progress() > 0.99);

    scene.apply_gesture(&GestureFrame::new(5_000, GestureLabel::OpenPalm));
    for _ in 0..300 {
        let (elapsed, dt) = time.update();
        scene.frame(dt, elapsed);
    }
    assert!(scene.progress() < 0.01);
    assert!(scene.foliage().progress() < 0.01);
}

#[test]
fn test_pinch_opens_gift_nearest_viewer() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    scene.set_memories(&memories(3));
    scene.frame(DT, DT);

    let viewer = scene.viewer();
    let transform = scene.group_transform();
    let (expected, _) = scene
        .group(0)
        .and_then(|g| g.nearest_gift(viewer, transform))
        .expect("default gifts group has gifts");

    let actions = scene.apply_gesture(&GestureFrame::new(0, GestureLabel::None).with_pinch(true));
    assert!(actions.contains(&SceneAction::OpenNearest));
    let events = scene.frame(DT, 2.0 * DT);
    assert_eq!(events.len(), 1);

    let (group, item) = scene.active().expect("a gift is open");
    assert_eq!(group, 0);
    assert_eq!(item.particle_id, expected);
    let expected_memory = &memories(3)[expected as usize % 3];
    assert_eq!(item.memory.name, expected_memory.name);
    assert_eq!(scene.audio().now_playing(), expected_memory.music.as_deref());
}

#[test]
fn test_open_gift_is_hidden_until_closed() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    scene.set_memories(&memories(1));
    scene.frame(DT, DT);
    scene.apply_gesture(&GestureFrame::new(0, GestureLabel::None).with_pinch(true));
    scene.frame(DT, 2.0 * DT);
    let id = scene.active().map(|(_, item)| item.particle_id).unwrap();

    let (mesh, slot) = scene.group(0).unwrap().slots().slot_of(id).unwrap();
    assert_eq!(mesh, SubMesh::Gift);
    let mut delegate = RecordingDelegate::new();
    scene.render(&mut delegate);
    let batch = delegate
        .batch(BatchKey::Ornament { group: 0, mesh })
        .expect("gift batch is drawn");
    assert_eq!(batch.transforms[slot].uniform_scale(), 0.0);

    scene.close_active();
    scene.frame(DT, 3.0 * DT);
    scene.render(&mut delegate);
    let batch = delegate.batch(BatchKey::Ornament { group: 0, mesh }).unwrap();
    assert!(batch.transforms[slot].uniform_scale() > 0.0);
}

#[test]
fn test_at_most_one_gift_open() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    scene.set_memories(&memories(4));
    let mut time = Time::simulated(DT);

    for i in 0..20u64 {
        let t = i * 600;
        scene.apply_gesture(&GestureFrame::new(t, GestureLabel::None).with_pinch(true));
        scene.apply_gesture(&GestureFrame::new(t + 1, GestureLabel::None));
        for slot in 0..3 {
            scene.click(0, SubMesh::Gift, slot);
        }
        let (elapsed, dt) = time.update();
        scene.frame(dt, elapsed);

        let open = scene
            .groups()
            .iter()
            .filter(|g| g.selection().is_active())
            .count();
        assert!(open <= 1, "{open} gifts open after round {i}");
    }
    assert!(scene.any_active());
}

#[test]
fn test_layout_survives_memory_changes() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    scene.frame(DT, DT);
    let before: Vec<_> = scene
        .groups()
        .iter()
        .map(|g| g.slots().clone())
        .collect();

    scene.set_memories(&memories(5));
    scene.set_memories(&memories(2));
    scene.set_memories(&[]);

    let after: Vec<_> = scene.groups().iter().map(|g| g.slots().clone()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_no_memories_means_nothing_opens() {
    let mut scene = Scene::new(small_config(), RecordingPlayback::new()).unwrap();
    scene.frame(DT, DT);
    scene.apply_gesture(&GestureFrame::new(0, GestureLabel::None).with_pinch(true));
    assert!(scene.frame(DT, 2.0 * DT).is_empty());
    assert!(scene.click(0, SubMesh::Gift, 0).is_none());
    assert!(!scene.any_active());
}

#[test]
fn test_click_through_camera_ray_opens_a_gift() {
    let mut scene = Scene::new(gifts_only_config(), RecordingPlayback::new()).unwrap();
    scene.set_memories(&memories(2));
    scene.set_tree_shape(true);
    let mut time = Time::simulated(DT);
    for _ in 0..300 {
        let (elapsed, dt) = time.update();
        scene.frame(dt, elapsed);
    }

    let camera = Camera::from_config(&scene.config().camera);
    let viewport = Vec2::new(800.0, 600.0);
    let view_proj = camera.view_proj(viewport.x / viewport.y);
    let target = scene
        .group(0)
        .and_then(|g| g.world_position(0, scene.group_transform()))
        .unwrap();
    let ndc = view_proj.project_point3(target);
    let cursor = Vec2::new((ndc.x + 1.0) * 0.5 * viewport.x, (1.0 - ndc.y) * 0.5 * viewport.y);

    let (origin, direction) = camera.ray_through(cursor, viewport);
    let event = scene.click_ray(origin, direction);
    assert!(matches!(event, Some(SelectionEvent::Opened { .. })));
    assert!(scene.any_active());

    // A miss far off to the side opens nothing and leaves the gift open.
    assert!(scene.click_ray(origin, Vec3::X).is_none());
    assert!(scene.any_active());
}
