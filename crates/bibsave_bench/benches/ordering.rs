//! Ordering engine benchmarks.

use bibsave_bench::random_database;
use bibsave_core::{sorted_records, SaveOrderConfig, SavePreferences, SortCriterion};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark insertion order with crossref targets moved first.
fn bench_original_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("original_order");
    let prefs = SavePreferences::default();

    for count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let ctx = random_database(count);
            b.iter(|| black_box(sorted_records(black_box(&ctx), None, &prefs).len()));
        });
    }
    group.finish();
}

/// Benchmark a stored three-criterion order.
fn bench_specified_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("specified_order");
    let prefs = SavePreferences::default();

    for count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut ctx = random_database(count);
            ctx.metadata.set_save_order_config(&SaveOrderConfig::specified([
                SortCriterion::ascending("author"),
                SortCriterion::descending("year"),
                SortCriterion::ascending("title"),
            ]));
            b.iter(|| black_box(sorted_records(black_box(&ctx), None, &prefs).len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_original_order, bench_specified_order);
criterion_main!(benches);
