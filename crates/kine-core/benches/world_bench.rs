use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use kine_core::{FoodField, KineConfig, World};

fn bench_frame_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_frame");
    for &level in &[0_i32, 3, 6] {
        group.bench_function(format!("level{level}_100_worms"), |b| {
            b.iter_batched(
                || {
                    let config = KineConfig {
                        rng_seed: Some(0xBEEF),
                        ..KineConfig::default()
                    };
                    let field = FoodField::new(640, 360, 0.5).expect("field");
                    let mut world = World::new(config, field).expect("world");
                    world.pacing_mut().set_level(level);
                    world
                },
                |mut world| {
                    for _ in 0..8 {
                        world.step_frame(0.02);
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frame_steps);
criterion_main!(benches);
