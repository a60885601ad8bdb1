//! Build and search throughput at several recall targets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use proximity::{similarity::Angular, Index, IndexConfig};

const DIMS: u32 = 64;
const POINTS: usize = 10_000;
const BUDGET: u64 = 32 << 20;

fn build_index(points: &[Vec<f32>]) -> Index<Angular> {
    let config = IndexConfig { seed: Some(0xBEA7), ..Default::default() };
    let mut index: Index<Angular> = Index::with_config(DIMS, BUDGET, config).unwrap();
    for p in points {
        index.insert(p).unwrap();
    }
    index.rebuild().unwrap();
    index
}

fn random_points(n: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..DIMS).map(|_| rng.sample::<f32, _>(StandardNormal)).collect())
        .collect()
}

fn bench_rebuild(c: &mut Criterion) {
    let points = random_points(POINTS, 1);
    let mut group = c.benchmark_group("rebuild");
    group.sample_size(10);
    group.bench_function("10k_64d", |b| {
        b.iter(|| black_box(build_index(&points)));
    });
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let points = random_points(POINTS, 2);
    let index = build_index(&points);
    let queries = random_points(100, 3);

    let mut group = c.benchmark_group("search_10k_64d");
    for recall in [0.5f32, 0.8, 0.95] {
        group.bench_with_input(BenchmarkId::from_parameter(recall), &recall, |b, &recall| {
            let mut i = 0;
            b.iter(|| {
                let q = &queries[i % queries.len()];
                i += 1;
                black_box(index.search(q, 10, recall, None).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_search);
criterion_main!(benches);
