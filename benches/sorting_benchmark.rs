use bigsort::prelude::*;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::Rng;
use std::hint::black_box;
use std::sync::Arc;

fn bench_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("String Sort");
    group.sample_size(10);

    // Dataset generation
    let mut rng = rand::rng();
    let count = 100_000;

    let random_strings: Vec<String> = (0..count)
        .map(|_| {
            let len = rng.random_range(5..20);
            (0..len).map(|_| rng.random::<char>()).collect()
        })
        .collect();

    group.bench_function("bigsort_indices", |b| {
        b.iter(|| bigsort_indices(black_box(&random_strings)))
    });

    // Includes pipeline startup and draining the lazy output.
    let shared = Arc::new(random_strings.clone());
    group.bench_function("bigsort (lazy)", |b| {
        b.iter(|| bigsort(black_box(shared.clone())).count())
    });

    // Std Sort Unstable over indices, the single-threaded baseline
    group.bench_function("slice::sort_unstable_by (indices)", |b| {
        b.iter_batched(
            || (0..random_strings.len()).collect::<Vec<usize>>(),
            |mut indices| {
                indices.sort_unstable_by(|&x, &y| random_strings[x].cmp(&random_strings[y]));
                indices
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_long_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("Long Common Prefix");
    group.sample_size(10);

    // Dataset with heavy prefixes: every digest collides
    let mut rng = rand::rng();
    let count = 100_000;
    let prefix = "common_prefix_which_is_quite_long_indeed_";

    let input: Vec<String> = (0..count)
        .map(|_| {
            let suffix: String = (0..5).map(|_| rng.random::<char>()).collect();
            format!("{}{}", prefix, suffix)
        })
        .collect();

    group.bench_function("bigsort (in-place)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| bigsort_mut(black_box(&mut data)),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("slice::sort_unstable", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort_unstable(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_strings, bench_long_prefix);
criterion_main!(benches);
