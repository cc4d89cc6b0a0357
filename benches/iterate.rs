use criterion::*;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

use vecs::Registry;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    group.bench_function("view_read_position_100k", |b| {
        b.iter_batched(
            || {
                let mut registry = Registry::new();
                populate(&mut registry, ENTITIES_MED);
                registry
            },
            |registry| {
                let mut total = 0.0_f32;
                for (_handle, (position,)) in registry.view::<(Position,)>() {
                    total += position.x;
                }
                black_box(total);
                black_box(registry);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("view_mut_integrate_100k", |b| {
        b.iter_batched(
            || {
                let mut registry = Registry::new();
                populate(&mut registry, ENTITIES_MED);
                registry
            },
            |mut registry| {
                for (_handle, (position, velocity)) in
                    registry.view_mut::<(Position, Velocity)>()
                {
                    position.x += velocity.dx;
                    position.y += velocity.dy;
                }
                black_box(registry);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("par_for_each_mass_100k", |b| {
        b.iter_batched(
            || {
                let mut registry = Registry::new();
                populate(&mut registry, ENTITIES_MED);
                registry
            },
            |registry| {
                let total = AtomicU64::new(0);
                registry.par_for_each::<(Mass,), _>(|_handle, (mass,)| {
                    total.fetch_add(mass.value as u64, Ordering::Relaxed);
                });
                black_box(total.load(Ordering::Relaxed));
                black_box(registry);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
