//! Codec benchmarks.
//!
//! Measures compress and expand throughput on a synthetic hand-value stream
//! and on incompressible input.
//!
//! Run with: cargo bench --bench codec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lzfi::{compress, compress_to_vec, expand, max_compressed_len};

fn plateau_stream(len: usize) -> Vec<i32> {
    (0..len)
        .map(|i| if i % 211 < 5 { -1 } else { ((i / 17) % 300) as i32 })
        .collect()
}

fn distinct_stream(len: usize) -> Vec<i32> {
    (0..len as i32).map(|i| i.wrapping_mul(0x9E37_79B1u32 as i32)).collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    for len in [100_000usize, 1_000_000] {
        let inputs = [
            ("plateau", plateau_stream(len)),
            ("distinct", distinct_stream(len)),
        ];
        for (name, input) in inputs {
            let mut out = vec![0; max_compressed_len(len)];
            group.throughput(Throughput::Elements(len as u64));
            group.bench_with_input(BenchmarkId::new(name, len), &input, |b, input| {
                b.iter(|| compress(black_box(input), &mut out).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    for len in [100_000usize, 1_000_000] {
        let input = plateau_stream(len);
        let block = compress_to_vec(&input);
        let mut out = vec![0; len];
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("plateau", len), &block, |b, block| {
            b.iter(|| expand(black_box(block), &mut out).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_expand);
criterion_main!(benches);
