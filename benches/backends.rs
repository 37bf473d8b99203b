use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use arbitrium::policies::create_backend;
use arbitrium::prelude::*;

/// Every backend discipline, so each graph shows all three side by side.
fn all_policies() -> Vec<PolicyType> {
    PolicyType::all().to_vec()
}

/// Runs a key sequence through a backend with get-or-insert semantics.
fn replay(policy: PolicyType, capacity: usize, keys: impl Iterator<Item = i32>) -> usize {
    let mut backend = create_backend::<i32, String>(policy, capacity);
    for key in keys {
        if backend.get(&key).is_none() {
            let _ = backend.put(key, format!("value_{key}"));
        }
    }
    backend.len()
}

/// Bench: Insert + Get pattern
fn bench_insert_then_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert+Get Pattern");
    for &size in &[100, 500, 1000, 2000] {
        for policy in all_policies() {
            group.bench_with_input(
                BenchmarkId::new(policy.name(), size),
                &(size, policy),
                |b, &(size, policy)| {
                    b.iter(|| {
                        let mut backend = create_backend::<i32, String>(policy, size / 2);
                        for i in 0..size {
                            let _ = backend.put(i as i32, format!("value_{i}"));
                        }
                        for i in 0..size {
                            let _ = backend.get(&(i as i32));
                        }
                        backend.len()
                    })
                },
            );
        }
    }
    group.finish();
}

/// Bench: Working set pattern (80/20 rule)
fn bench_working_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("Working Set Pattern (80/20)");
    for &(cache_size, total_accesses) in &[(100, 500), (200, 1000), (300, 1500)] {
        for policy in all_policies() {
            group.bench_with_input(
                BenchmarkId::new(policy.name(), format!("cache{cache_size}_acc{total_accesses}")),
                &(cache_size, total_accesses, policy),
                |b, &(cache_size, total_accesses, policy)| {
                    let hot_keys = cache_size / 5;
                    b.iter(|| {
                        replay(
                            policy,
                            cache_size,
                            (0..total_accesses).map(|i| {
                                if i % 5 < 4 { (i % hot_keys) as i32 } else { i as i32 }
                            }),
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

/// Bench: Cyclic scan slightly larger than the cache
fn bench_cyclic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cyclic Pattern");
    for &(cache_size, cycle_length) in &[(100, 110), (200, 220), (500, 550)] {
        for policy in all_policies() {
            group.bench_with_input(
                BenchmarkId::new(policy.name(), format!("cycle{cycle_length}_cache{cache_size}")),
                &(cache_size, cycle_length, policy),
                |b, &(cache_size, cycle_length, policy)| {
                    b.iter(|| {
                        replay(
                            policy,
                            cache_size,
                            (0..cycle_length * 10).map(|i| (i % cycle_length) as i32),
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

/// Bench: Export + import of a full store, the cost of one switch
fn bench_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("Migration");
    for &size in &[100, 1000, 10000] {
        for from in all_policies() {
            let mut source = create_backend::<i32, String>(from, size);
            for i in 0..size {
                let _ = source.put(i as i32, format!("value_{i}"));
            }
            group.bench_with_input(BenchmarkId::new(from.name(), size), &size, |b, &size| {
                b.iter(|| {
                    let mut entries = source.export_entries();
                    entries.sort_by_key(|e| e.insertion_order);
                    let mut target = create_backend::<i32, String>(PolicyType::Frequency, size);
                    for entry in entries {
                        let _ = target.import_entry(entry);
                    }
                    target.len()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_then_get,
    bench_working_set,
    bench_cyclic,
    bench_migration
);
criterion_main!(benches);
