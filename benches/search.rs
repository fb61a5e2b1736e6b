use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use imsim::metric::{Metric, cosine, dot, l2_norm};
use imsim::SimilarityIndex;
use ndarray::Array2;
use rand::prelude::*;

fn random_index(n: usize, dim: usize, metric: Metric) -> SimilarityIndex {
    let mut rng = rand::rng();
    let data = (0..n * dim).map(|_| rng.random_range(-1.0f32..1.0)).collect::<Vec<_>>();
    let matrix = Array2::from_shape_vec((n, dim), data).unwrap();
    let keys = (0..n).map(|i| format!("{i}.jpg")).collect();
    SimilarityIndex::new(matrix, keys, metric).unwrap()
}

fn bench_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dot");
    let mut rng = rand::rng();
    let src = (0..768).map(|_| rng.random::<f32>()).collect::<Vec<_>>();
    let dst = (0..768 << 10).map(|_| rng.random::<f32>()).collect::<Vec<_>>();

    group.throughput(Throughput::Bytes((dst.len() * 4) as u64));
    group.bench_function("dot_naive", |b| {
        b.iter(|| {
            dst.chunks_exact(768)
                .map(|chunk| src.iter().zip(chunk).map(|(a, b)| a * b).sum::<f32>())
                .sum::<f32>()
        });
    });
    group.bench_function("dot_unrolled", |b| {
        b.iter(|| dst.chunks_exact(768).map(|chunk| dot(&src, chunk)).sum::<f32>());
    });
    group.bench_function("cosine", |b| {
        let na = l2_norm(&src);
        b.iter(|| {
            dst.chunks_exact(768).map(|chunk| cosine(&src, chunk, na, l2_norm(chunk))).sum::<f32>()
        });
    });
    group.finish();
}

fn bench_find_similar(c: &mut Criterion) {
    let mut group = c.benchmark_group("FindSimilar");
    let dim = 768;
    let mut rng = rand::rng();
    let query = (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect::<Vec<_>>();

    for metric in [Metric::Cosine, Metric::Euclidean] {
        for n in [1000, 10000] {
            let index = random_index(n, dim, metric);
            group.throughput(Throughput::Elements(n as u64));
            group.bench_with_input(BenchmarkId::new(metric.as_str(), n), &index, |b, index| {
                b.iter(|| index.find_similar(&query, black_box(10)).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_dot, bench_find_similar);
criterion_main!(benches);
