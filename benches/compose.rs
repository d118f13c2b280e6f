//! Performance benchmarks for excuse composition.
//!
//! Run with: `cargo bench --bench compose`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Simple compose | <50µs | 4 uniform draws over the snapshot |
//! | Daily compose | <50µs | Fresh ChaCha8 generator per call |
//! | Role compose | <100µs | Role-scoped draw plus fallback scan |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::NaiveDate;
use excuse_engine::{
    ContentPool, ExcuseComposer, Fragment, FragmentId, FragmentKind, GenerationMode, Law, Meme,
    Role,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

/// Pool with `per_kind` fragments of every kind, a third of them role-affine.
fn make_pool(per_kind: usize) -> ContentPool {
    let mut fragments = Vec::with_capacity(per_kind * 4);
    let mut next = 1u128;
    for kind in FragmentKind::DRAW_ORDER {
        for i in 0..per_kind {
            let role = (i % 3 == 0).then(|| Role::ALL[i % Role::ALL.len()]);
            fragments.push(
                Fragment::new(kind, format!("{} benchmark fragment {}", kind, i), role)
                    .with_id(FragmentId::new(Uuid::from_u128(next))),
            );
            next += 1;
        }
    }
    let memes = (0..per_kind)
        .map(|i| Meme::new("Anon", format!("benchmark meme number {}", i)))
        .collect();
    let laws = (0..per_kind)
        .map(|i| Law::new(format!("Law {}", i), "Benchmarks always lie.", "Murphy"))
        .collect();
    ContentPool::new(fragments, memes, laws)
}

fn bench_compose_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    for per_kind in [10usize, 100, 1000] {
        let pool = make_pool(per_kind);
        let composer = ExcuseComposer::new(&pool);
        group.throughput(Throughput::Elements(1));

        group.bench_with_input(BenchmarkId::new("simple", per_kind), &per_kind, |b, _| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(composer.compose_simple_with_rng(&mut rng).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("ultra", per_kind), &per_kind, |b, _| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(composer.compose_with_rng(GenerationMode::Ultra, &mut rng).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("by_role", per_kind), &per_kind, |b, _| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(composer.compose_by_role_with_rng("dev", &mut rng).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("daily", per_kind), &per_kind, |b, _| {
            let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            b.iter(|| black_box(composer.compose_daily_for(black_box(day)).unwrap()))
        });
    }

    group.finish();
}

fn bench_pool_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    for per_kind in [100usize, 1000] {
        let pool = make_pool(per_kind);
        let fragments = pool.fragments().to_vec();
        group.throughput(Throughput::Elements(fragments.len() as u64));

        group.bench_with_input(BenchmarkId::new("build", per_kind), &fragments, |b, fragments| {
            b.iter(|| black_box(ContentPool::new(fragments.clone(), vec![], vec![])))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compose_modes, bench_pool_snapshot);
criterion_main!(benches);
