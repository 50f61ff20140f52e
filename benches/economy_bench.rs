use colony_economy::planet::{GenerationConfig, ResourceField};
use colony_economy::Simulation;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_field_generation(c: &mut Criterion) {
    let config = GenerationConfig::default();
    let mut field = ResourceField::from_config(&config);

    c.bench_function("generate_field_20x20", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| black_box(field.generate(&config, &mut rng)))
    });
}

fn bench_simulated_day(c: &mut Criterion) {
    c.bench_function("simulate_one_day", |b| {
        b.iter_batched(
            || {
                let mut sim = Simulation::with_defaults(42);
                let units = sim.colony().sects()[0].units().len();
                for unit in 0..units {
                    let _ = sim.start_unit(0, unit);
                }
                sim
            },
            |mut sim| {
                let day = sim.scheduler().ticks_to_seconds(sim.scheduler().ticks_per_day());
                black_box(sim.advance(day))
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_field_generation, bench_simulated_day);
criterion_main!(benches);
