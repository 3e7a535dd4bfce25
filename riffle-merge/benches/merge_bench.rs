//! Merge-grouping throughput over in-memory sorted runs.
//!
//! Run with `cargo bench -p riffle-merge`.

#![forbid(unsafe_code)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use riffle_merge::{
    MemSortedStream, MergeGroupEngine, MergeOptions, SecondarySortAdapter, SortedStream,
};
use riffle_spill::SpillConfig;
use riffle_test_utils::data::{composite_runs, keyed_runs};
use riffle_types::tuple;

// ---------------------------------------------------------------------------
// Input generation
// ---------------------------------------------------------------------------

const KEYS: usize = 2_000;
const MAX_VALUES: usize = 8;
const HOT_VALUES: i64 = 20_000;

fn build_sources(ordinals: usize, seed: u64) -> Vec<Box<dyn SortedStream>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..ordinals)
        .map(|_| {
            Box::new(MemSortedStream::new(keyed_runs(&mut rng, KEYS, MAX_VALUES)))
                as Box<dyn SortedStream>
        })
        .collect()
}

fn build_hot_source() -> Vec<Box<dyn SortedStream>> {
    let rows = (0..HOT_VALUES).map(|i| tuple![7, i]).collect();
    vec![Box::new(MemSortedStream::new(vec![(tuple![7], rows)])) as Box<dyn SortedStream>]
}

fn build_composite_source(seed: u64) -> Vec<Box<dyn SortedStream>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let runs = composite_runs(&mut rng, KEYS, 6);
    let adapter = SecondarySortAdapter::new(MemSortedStream::new(runs), 1);
    vec![Box::new(adapter) as Box<dyn SortedStream>]
}

/// Drain the engine, touching every key and value field.
fn drain(mut engine: MergeGroupEngine) -> u64 {
    let mut fields = 0u64;
    let summary = engine
        .run(|key, groups| {
            fields += key.len() as u64;
            for group in groups {
                for value in group {
                    fields += value?.len() as u64;
                }
            }
            Ok(())
        })
        .expect("merge run");
    black_box(summary.keys_emitted) + fields
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_merge_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("MergeGroupEngine");

    group.bench_function("three_way_in_memory", |b| {
        b.iter_batched(
            || build_sources(3, 0x5EED_0000_0000_0001),
            |sources| {
                let engine = MergeGroupEngine::new(sources)
                    .expect("engine")
                    .with_options(MergeOptions::default().with_check_ordering(false));
                drain(engine)
            },
            BatchSize::PerIteration,
        );
    });

    group.bench_function("secondary_sort_one_wide", |b| {
        b.iter_batched(
            || build_composite_source(0x5EED_0000_0000_0002),
            |sources| {
                let engine = MergeGroupEngine::new(sources)
                    .expect("engine")
                    .with_options(MergeOptions::default().with_check_ordering(false));
                drain(engine)
            },
            BatchSize::PerIteration,
        );
    });

    group.bench_function("hot_key_spill_raw", |b| {
        let spill = SpillConfig::default()
            .with_list_spill_threshold(1024)
            .with_compress_spills(false);
        b.iter_batched(
            build_hot_source,
            |sources| {
                let engine = MergeGroupEngine::new(sources)
                    .expect("engine")
                    .with_options(
                        MergeOptions::default()
                            .with_check_ordering(false)
                            .with_spill(spill.clone()),
                    );
                drain(engine)
            },
            BatchSize::PerIteration,
        );
    });

    group.bench_function("hot_key_spill_gzip", |b| {
        let spill = SpillConfig::default().with_list_spill_threshold(1024);
        b.iter_batched(
            build_hot_source,
            |sources| {
                let engine = MergeGroupEngine::new(sources)
                    .expect("engine")
                    .with_options(
                        MergeOptions::default()
                            .with_check_ordering(false)
                            .with_spill(spill.clone()),
                    );
                drain(engine)
            },
            BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_merge_group
}
criterion_main!(benches);
