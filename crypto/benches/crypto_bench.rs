use criterion::{black_box, criterion_group, criterion_main, Criterion};

use classic_crypto::{keccak256, keccak512, seal_hash, Keccak512Hasher};
use classic_types::Header;

fn keccak256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("keccak256_256B", |b| {
        b.iter(|| keccak256(black_box(&data)))
    });
}

fn keccak512_row_bench(c: &mut Criterion) {
    let row = [0x5Au8; 64];

    c.bench_function("keccak512_64B_oneshot", |b| {
        b.iter(|| keccak512(black_box(&row)))
    });

    let mut hasher = Keccak512Hasher::new();
    c.bench_function("keccak512_64B_reused", |b| {
        b.iter(|| hasher.hash(black_box(&row)))
    });
}

fn seal_hash_bench(c: &mut Criterion) {
    let header = Header {
        number: 15_000_000,
        gas_limit: 8_000_000,
        time: 1_650_000_000,
        ..Default::default()
    };

    c.bench_function("seal_hash", |b| b.iter(|| seal_hash(black_box(&header))));
}

criterion_group!(benches, keccak256_bench, keccak512_row_bench, seal_hash_bench);
criterion_main!(benches);
