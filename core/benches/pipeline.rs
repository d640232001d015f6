//! Throughput of the buffer-backed pipelines across codecs and payload sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iochain_core::prelude::*;

fn payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn benchmark_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress_round_trip");

    for size in [1024usize, 65_536, 1_048_576] {
        group.throughput(Throughput::Bytes(size as u64));
        let data = payload(size);

        for codec in CompressionCodec::ALL {
            group.bench_with_input(BenchmarkId::new(codec.name(), size), &data, |b, data| {
                b.iter(|| {
                    let packed = ByteOutBuilder::new()
                        .compress_with(codec.encoder())
                        .write_bytes(data)
                        .expect("compress should succeed");
                    let unpacked = InBuilder::bytes(packed)
                        .decompress_with(codec.decoder())
                        .read_bytes()
                        .expect("decompress should succeed");
                    std::hint::black_box(unpacked);
                });
            });
        }
    }
    group.finish();
}

fn benchmark_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_lines");
    let lines: Vec<String> = (0..10_000).map(|i| format!("line number {i}")).collect();

    group.bench_function("gzip_base64_write_read", |b| {
        b.iter(|| {
            let encoded = StringOutBuilder::new()
                .named("lines.gz")
                .compress()
                .encode_base64()
                .write_lines(&lines)
                .expect("write should succeed");
            let packed = InBuilder::string(encoded).decode_base64().read_bytes().expect("base64 should decode");
            let source = Named::new("lines.gz", InputSource::memory(packed));
            let read = InBuilder::new(source).decompress().read_lines().expect("read should succeed");
            std::hint::black_box(read);
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_compress, benchmark_text);
criterion_main!(benches);
