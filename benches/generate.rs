//! Benchmarks equation generation and pool pre-generation.

#![allow(missing_docs)]

use chrono::NaiveDate;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use equatle::{Allocator, Generator, MemoryStore};
use rand::{SeedableRng, rngs::StdRng};

fn generate(c: &mut Criterion) {
    let generator = Generator::default();
    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("generate puzzle", |b| {
        b.iter(|| generator.generate_with(&mut rng).unwrap());
    });
}

fn pre_generate_year(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

    c.bench_function("pre-generate a year", |b| {
        b.iter_batched(
            || Allocator::new(MemoryStore::new(), Generator::default()),
            |allocator| allocator.pre_generate_range(start, end).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, generate, pre_generate_year);
criterion_main!(benches);
