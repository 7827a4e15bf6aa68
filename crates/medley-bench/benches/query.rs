//! Query throughput against a pre-built index, across population sizes.
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use medley_bench::{SizeTier, generate_population};
use medley_core::{IndexPaths, InMemoryIndexStore, build_all_indexes, find_related_by_ids};

fn paths() -> IndexPaths {
    IndexPaths {
        hash2id: "bench-hash2id".to_owned(),
        id2hash: "bench-id2hash".to_owned(),
        match2id: "bench-match2id".to_owned(),
        id2match: "bench-id2match".to_owned(),
    }
}

fn bench_find_related_by_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_related_by_ids");

    for (name, tier) in [
        ("S", SizeTier::Small),
        ("M", SizeTier::Medium),
        ("L", SizeTier::Large),
    ] {
        let population = generate_population(&tier.config(42));
        let mut store = InMemoryIndexStore::new();
        build_all_indexes(&population, &["fname%1,lname"], 1, &mut store, &paths()).expect("build should succeed");

        let seed_ids: Vec<_> = population.iter().take(10).map(|(id, _)| *id).collect();
        group.throughput(Throughput::Elements(seed_ids.len() as u64));

        group.bench_with_input(BenchmarkId::new("ten_seeds", name), &seed_ids, |b, seed_ids| {
            b.iter(|| {
                let _ = find_related_by_ids(seed_ids, &store, None);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_related_by_ids);
criterion_main!(benches);
