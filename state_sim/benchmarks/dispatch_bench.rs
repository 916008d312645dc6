use std::sync::Arc;

use bridge_runtime::{CommandDispatcher, MemoryChannel};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use state_sim::{state_capability_table, StateWorld, WorldPreset};

fn preset_with(size: usize) -> Arc<WorldPreset> {
    let names: Vec<String> = (0..size).map(|index| format!("State{index}")).collect();
    Arc::new(WorldPreset::with_states(&names))
}

fn bench_register_until_exhausted(c: &mut Criterion) {
    let mut group = c.benchmark_group("register");

    for size in [16usize, 64, 256, 1024] {
        let preset = preset_with(size);
        group.bench_with_input(BenchmarkId::new("states", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let world = StateWorld::generate(Arc::clone(&preset), 1);
                    let dispatcher = CommandDispatcher::new(
                        state_capability_table().expect("valid table"),
                        Arc::new(MemoryChannel::new()),
                        ChaCha8Rng::seed_from_u64(1),
                    );
                    (world, dispatcher)
                },
                |(mut world, mut dispatcher)| {
                    for index in 0..=size {
                        dispatcher.dispatch(&mut world, &format!("register player{index}"));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(dispatch_benches, bench_register_until_exhausted);
criterion_main!(dispatch_benches);
