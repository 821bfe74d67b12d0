//! Transition-function throughput.
//!
//! The planner calls `step` once per (node, move, run) triple, so its cost
//! bounds search throughput. These benches measure a single step on flat
//! ground and a 600-tick rollout across a level with many platforms, which
//! exercises the grid broad phase.
//!
//! Run with: `cargo bench --bench step_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use strider_core::prelude::*;

// ---------------------------------------------------------------------------
// Level setup
// ---------------------------------------------------------------------------

fn platform_field(platforms: usize) -> StaticWorld {
    let mut objects = vec![StaticObject::wall(
        Polygon::rect(-100.0, -64.0, 64.0 * platforms as f64 + 100.0, -16.0).unwrap(),
    )];
    for i in 0..platforms {
        let left = 64.0 * i as f64;
        let bottom = 48.0 + 24.0 * (i % 5) as f64;
        objects.push(StaticObject::wall(
            Polygon::rect(left, bottom, left + 40.0, bottom + 8.0).unwrap(),
        ));
    }
    StaticWorld::new(objects)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_single_step(c: &mut Criterion) {
    let world = platform_field(1);
    let settings = PhysicsSettings::default();
    let state = ActorState::grounded(0.0, 0.0);

    c.bench_function("step_flat_ground_run_right", |b| {
        b.iter(|| black_box(step(black_box(&state), &world, Move::D, true, &settings)));
    });
}

fn bench_rollout_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollout_600_ticks");
    let settings = PhysicsSettings::default();
    let steps: Vec<MacroStep> = (0..600)
        .map(|i| MacroStep {
            mv: if i % 20 == 0 { Move::WD } else { Move::D },
            run: true,
        })
        .collect();

    for &platforms in &[10usize, 100, 1000] {
        let world = platform_field(platforms);
        group.bench_with_input(
            BenchmarkId::from_parameter(platforms),
            &platforms,
            |b, _| {
                b.iter(|| {
                    let states =
                        rollout(&ActorState::grounded(0.0, 0.0), &world, &steps, &settings);
                    black_box(states.len())
                });
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_single_step, bench_rollout_scaling);
criterion_main!(benches);
