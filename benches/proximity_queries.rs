#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sendero::{EuclideanSpace, IndexKind, IndexOptions, Roadmap, RoadmapOptions};

const DIMENSION: usize = 6;
const QUERIES: usize = 256;

fn sample(rng: &mut ChaCha8Rng) -> Vec<f64> {
    (0..DIMENSION).map(|_| rng.gen_range(0.0..1.0)).collect()
}

fn build(kind: IndexKind, size: usize) -> Roadmap {
    let options = RoadmapOptions::default().index(IndexOptions {
        kind,
        ..IndexOptions::default()
    });
    let mut map: Roadmap =
        Roadmap::new(Arc::new(EuclideanSpace::new(DIMENSION)), &options).expect("roadmap");
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let points: Vec<Vec<f64>> = (0..size).map(|_| sample(&mut rng)).collect();
    map.add_configurations(points.iter().map(Vec::as_slice))
        .expect("populate");
    map
}

fn queries() -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    (0..QUERIES).map(|_| sample(&mut rng)).collect()
}

fn k_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity/k_nearest");
    group.sample_size(30);
    group.throughput(Throughput::Elements(QUERIES as u64));
    let queries = queries();
    for size in [1_000usize, 10_000] {
        for kind in [IndexKind::Linear, IndexKind::Navigable] {
            let map = build(kind, size);
            group.bench_with_input(
                BenchmarkId::new(format!("{kind:?}"), size),
                &map,
                |b, map| {
                    b.iter(|| {
                        for q in &queries {
                            black_box(map.k_nearest(q, 10).expect("query"));
                        }
                    });
                },
            );
        }
    }
    group.finish();
}

fn radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity/within_or_closest");
    group.sample_size(20);
    group.throughput(Throughput::Elements(QUERIES as u64));
    let queries = queries();
    for kind in [IndexKind::Linear, IndexKind::Navigable] {
        let map = build(kind, 5_000);
        group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), 5_000), &map, |b, map| {
            b.iter(|| {
                for q in &queries {
                    black_box(map.within_or_closest(q, 0.2).expect("query"));
                }
            });
        });
    }
    group.finish();
}

fn insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity/build");
    group.sample_size(10);
    for kind in [IndexKind::Linear, IndexKind::Navigable] {
        group.bench_function(BenchmarkId::new(format!("{kind:?}"), 2_000), |b| {
            b.iter(|| black_box(build(kind, 2_000)));
        });
    }
    group.finish();
}

criterion_group!(benches, k_nearest, radius, insert);
criterion_main!(benches);
