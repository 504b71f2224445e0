//! Benchmarks for the CPU-side simulation and rendering paths.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;

use springle::config::{GradientConfig, SimulationParams, SystemConfig, TrailConfig};
use springle::group::GroupId;
use springle::{ColorPaletteTable, CpuCanvas, GradientTextureCache, Rgb, SimulationController, TrailStore};

const DT: f32 = 1.0 / 60.0;

fn bench_trail_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("trail_update");

    for count in [1_000usize, 10_000, 50_000] {
        group.bench_with_input(BenchmarkId::new("points", count), &count, |b, &count| {
            let config = TrailConfig {
                capacity: count,
                ..Default::default()
            };
            let mut trails = TrailStore::new(config, 1.0e6);
            for i in 0..count {
                let x = (i % 800) as f32;
                trails.add_point(
                    Vec2::new(x, 300.0),
                    Rgb::new(200, 100, 50),
                    10.0,
                    200,
                    GroupId(0),
                    0.0,
                );
            }
            let mut now = 0.0f64;
            b.iter(|| {
                now += DT as f64;
                trails.update(DT, black_box(now), 200);
            })
        });
    }

    group.finish();
}

fn bench_gradient_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_cache");

    group.bench_function("hit", |b| {
        let mut cache = GradientTextureCache::new(GradientConfig::default());
        cache.get_or_create(25.0, Rgb::new(255, 128, 0), 200, 0.2);
        b.iter(|| black_box(cache.get_or_create(25.0, Rgb::new(255, 128, 0), 200, 0.2).id))
    });

    group.bench_function("miss_small", |b| {
        let mut cache = GradientTextureCache::new(GradientConfig::default());
        let mut n = 0u8;
        b.iter(|| {
            n = n.wrapping_add(1);
            black_box(cache.get_or_create(8.0, Rgb::new(n, 0, 0), 255, 0.2).id)
        })
    });

    group.bench_function("miss_large", |b| {
        let mut cache = GradientTextureCache::new(GradientConfig::default());
        let mut n = 0u8;
        b.iter(|| {
            n = n.wrapping_add(1);
            black_box(cache.get_or_create(90.0, Rgb::new(0, n, 0), 255, 0.2).id)
        })
    });

    group.finish();
}

fn bench_palette(c: &mut Criterion) {
    let mut group = c.benchmark_group("palette");

    group.bench_function("get_color_cached", |b| {
        let mut palettes = ColorPaletteTable::builtin();
        b.iter(|| black_box(palettes.get_color(3, 2, 0.5)))
    });

    group.bench_function("get_color_sweep", |b| {
        let mut palettes = ColorPaletteTable::builtin();
        let mut t = 0.0f32;
        b.iter(|| {
            t = (t + 0.001) % 1.0;
            black_box(palettes.get_color(3, 2, t))
        })
    });

    group.finish();
}

fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller");
    group.sample_size(20);

    for groups in [1usize, 7, 20] {
        let params = SimulationParams {
            max_groups: groups,
            max_circles: 20,
            min_circles: 20,
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("update", groups), &groups, |b, &n| {
            let mut sim = SimulationController::with_params(
                SystemConfig::new(1280, 720).with_seed(1),
                &params,
            );
            while sim.active_group_count() < n {
                sim.create_new_group();
            }
            b.iter(|| sim.update(black_box(DT), &params))
        });

        group.bench_with_input(BenchmarkId::new("draw_cpu", groups), &groups, |b, &n| {
            let mut sim = SimulationController::with_params(
                SystemConfig::new(1280, 720).with_seed(1),
                &params,
            );
            while sim.active_group_count() < n {
                sim.create_new_group();
            }
            for _ in 0..60 {
                sim.update(DT, &params);
            }
            let mut canvas = CpuCanvas::new(1280, 720, Rgb::BLACK);
            b.iter(|| black_box(sim.draw(&mut canvas, params.gradient_sharpness).len()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_trail_update,
    bench_gradient_cache,
    bench_palette,
    bench_controller,
);
criterion_main!(benches);
