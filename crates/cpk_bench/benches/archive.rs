//! Archive walking and extraction benchmarks.

use cpk_bench::utils::archive_image;
use cpk_core::{CpkArchive, UnpackConfig, Unpacker};
use cpk_storage::{FileBackend, InMemoryBackend};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use tempfile::TempDir;

/// Benchmark opening an archive and reading all TOC entries.
fn bench_entries(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpk_entries");

    for files in [16, 256, 1024].iter() {
        let source = InMemoryBackend::with_data(archive_image(*files, 64));
        group.bench_with_input(BenchmarkId::from_parameter(files), files, |b, _| {
            b.iter(|| {
                let archive = CpkArchive::open(&source).unwrap();
                black_box(archive.entries(&source).unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark unpacking an archive file to disk.
fn bench_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpk_unpack");
    group.sample_size(10);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.cpk");
    let files = 64;
    let size = 16 * 1024;
    fs::write(&path, archive_image(files, size)).unwrap();
    let source = FileBackend::open_read_only(&path).unwrap();

    group.throughput(Throughput::Bytes((files * size) as u64));
    group.bench_function("raw_entries", |b| {
        let out = dir.path().join("out");
        let unpacker = Unpacker::new(UnpackConfig::new().output_dir(&out));
        b.iter(|| black_box(unpacker.unpack(&source).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_entries, bench_unpack);
criterion_main!(benches);
