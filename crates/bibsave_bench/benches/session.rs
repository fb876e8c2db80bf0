//! Atomic save benchmarks.

use bibsave_bench::random_database;
use bibsave_core::{DatabaseWriter, SavePreferences};
use bibsave_storage::Encoding;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

/// Benchmark full saves to disk, per output encoding.
fn bench_save_to(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_to");
    // File operations are slower; fewer samples
    group.sample_size(20);

    let ctx = random_database(1000);
    let writer = DatabaseWriter::new();

    for encoding in [Encoding::Utf8, Encoding::UsAscii, Encoding::Iso8859_1] {
        let prefs = SavePreferences::default().encoding(encoding).make_backup(false);
        group.bench_with_input(BenchmarkId::from_parameter(encoding), &prefs, |b, prefs| {
            let temp_dir = TempDir::new().unwrap();
            let dest = temp_dir.path().join("bench.bib");

            b.iter(|| {
                let receipt = writer.save_to(&ctx, prefs, &dest).unwrap();
                black_box(receipt.bytes_written);
            });
        });
    }

    group.bench_function("with_backup", |b| {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("bench.bib");
        let prefs = SavePreferences::default();

        b.iter(|| {
            let receipt = writer.save_to(&ctx, &prefs, &dest).unwrap();
            black_box(receipt.backup);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_save_to);
criterion_main!(benches);
