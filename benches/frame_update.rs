//! Benchmarks for the per-frame CPU work of the scene.
//!
//! Run with: `cargo bench`

use arix::foliage::foliage_shader_wgsl;
use arix::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const DT: f32 = 1.0 / 60.0;

fn scene_with_foliage(count: u32) -> Scene<NullPlayback> {
    let mut config = SceneConfig {
        seed: Some(1),
        ..Default::default()
    };
    config.foliage.count = count;
    Scene::new(config, NullPlayback).expect("default config is valid")
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_frame");

    for &count in &[1_500u32, 15_000] {
        group.bench_with_input(BenchmarkId::new("scattered", count), &count, |b, &count| {
            let mut scene = scene_with_foliage(count);
            let mut elapsed = 0.0;
            b.iter(|| {
                elapsed += DT;
                black_box(scene.frame(DT, elapsed))
            })
        });

        group.bench_with_input(BenchmarkId::new("forming", count), &count, |b, &count| {
            let mut scene = scene_with_foliage(count);
            scene.set_tree_shape(true);
            let mut elapsed = 0.0;
            b.iter(|| {
                elapsed += DT;
                black_box(scene.frame(DT, elapsed))
            })
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut scene = scene_with_foliage(15_000);
    scene.frame(DT, DT);
    let mut delegate = RecordingDelegate::new();

    c.bench_function("scene_render_recording", |b| {
        b.iter(|| {
            scene.render(&mut delegate);
            black_box(delegate.instance_count())
        })
    });
}

fn bench_pick(c: &mut Criterion) {
    let mut scene = scene_with_foliage(1_500);
    scene.frame(DT, DT);
    let camera = Camera::from_config(&scene.config().camera);
    let (origin, direction) = camera.ray_through(Vec2::new(640.0, 400.0), Vec2::new(1280.0, 800.0));

    c.bench_function("scene_pick_center", |b| {
        b.iter(|| black_box(scene.pick(black_box(origin), black_box(direction))))
    });
}

fn bench_shader_gen(c: &mut Criterion) {
    c.bench_function("foliage_shader_wgsl", |b| {
        b.iter(|| black_box(foliage_shader_wgsl(black_box(0.9))))
    });
}

criterion_group!(benches, bench_frame, bench_render, bench_pick, bench_shader_gen);
criterion_main!(benches);
