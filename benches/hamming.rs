use aksearch::hamming::{hamming_488, hamming_naive, knn_hamming};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn random_bytes(len: usize, mut state: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(len);
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        bytes.push(state as u8);
    }
    bytes
}

fn bench_hamming(c: &mut Criterion) {
    let va = random_bytes(61, 1);
    let vb = random_bytes(61, 2);

    c.bench_function("hamming_488", |b| {
        b.iter(|| hamming_488(black_box(&va), black_box(&vb)))
    });
    c.bench_function("hamming_naive_488", |b| {
        b.iter(|| hamming_naive::<488>(black_box(&va), black_box(&vb)))
    });
}

fn bench_knn(c: &mut Criterion) {
    // 10 万个向量的暴力扫描
    let query = random_bytes(61, 1);
    let base = random_bytes(61 * 100_000, 2);

    c.bench_function("knn_hamming_100k", |b| {
        b.iter(|| knn_hamming::<488>(black_box(&query), black_box(&base), 1))
    });
}

criterion_group!(benches, bench_hamming, bench_knn);
criterion_main!(benches);
