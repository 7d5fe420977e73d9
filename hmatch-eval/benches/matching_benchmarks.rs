use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hmatch_core::{DescriptorSet, DistanceMetric, Features, Homography, Keypoint};
use hmatch_eval::{classify_correspondences, knn2, nndr_filter};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

fn random_keypoints(rng: &mut Pcg64, n: usize) -> Vec<Keypoint> {
    (0..n)
        .map(|_| Keypoint::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)))
        .collect()
}

fn binary_features(n: usize, seed: u64) -> Features {
    let mut rng = Pcg64::seed_from_u64(seed);
    let keypoints = random_keypoints(&mut rng, n);
    let descriptors = (0..n).map(|_| rng.r#gen::<[u8; 32]>()).collect();
    Features::new(keypoints, DescriptorSet::Binary(descriptors)).unwrap()
}

fn float_features(n: usize, dim: usize, seed: u64) -> Features {
    let mut rng = Pcg64::seed_from_u64(seed);
    let keypoints = random_keypoints(&mut rng, n);
    let data = (0..n * dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    Features::new(keypoints, DescriptorSet::float(dim, data).unwrap()).unwrap()
}

fn bench_knn2(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn2");
    for n in [250, 1000] {
        let (a, b) = (binary_features(n, 1), binary_features(n, 2));
        group.bench_with_input(BenchmarkId::new("hamming", n), &n, |bench, _| {
            bench.iter(|| knn2(black_box(&a), black_box(&b), DistanceMetric::Hamming).unwrap())
        });

        let (a, b) = (float_features(n, 64, 1), float_features(n, 64, 2));
        group.bench_with_input(BenchmarkId::new("euclidean", n), &n, |bench, _| {
            bench.iter(|| knn2(black_box(&a), black_box(&b), DistanceMetric::Euclidean).unwrap())
        });
    }
    group.finish();
}

fn bench_filter_and_classify(c: &mut Criterion) {
    let a = binary_features(1000, 3);
    let b = binary_features(1000, 4);
    let candidates = knn2(&a, &b, DistanceMetric::Hamming).unwrap();
    let h = Homography::identity();

    c.bench_function("nndr_filter + classify", |bench| {
        bench.iter(|| {
            let accepted = nndr_filter(black_box(&candidates), 0.95);
            classify_correspondences(&accepted, &h, 2.5)
        })
    });
}

criterion_group!(benches, bench_knn2, bench_filter_and_classify);
criterion_main!(benches);
