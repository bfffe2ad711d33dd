use criterion::{black_box, criterion_group, criterion_main, Criterion};
use league_core::default_registry;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schedule_gen::manifest::build_manifest;
use schedule_gen::{generate_schedule, SchedulerConfig};

fn bench_manifest(c: &mut Criterion) {
    let registry = default_registry();
    c.bench_function("manifest 2024", |b| {
        b.iter(|| black_box(build_manifest(&registry, black_box(2024), 17)))
    });
}

fn bench_season(c: &mut Criterion) {
    let registry = default_registry();
    let config = SchedulerConfig::default();
    let mut seed = 0u64;
    c.bench_function("generate season", |b| {
        b.iter(|| {
            seed += 1;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let _ = black_box(generate_schedule(2024, &registry, &config, &mut rng));
        })
    });
}

criterion_group!(benches, bench_manifest, bench_season);
criterion_main!(benches);
