use arbitrium::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CacheError> {
    // RUST_LOG=arbitrium=info shows every policy switch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Arbitrium Adaptive Cache Demo ===\n");

    demo_basic_access()?;
    demo_manual_switch()?;
    demo_controller_comparison()?;
    Ok(())
}

/// Demonstrates get-or-insert access on a small cache
fn demo_basic_access() -> Result<(), CacheError> {
    println!("1. Basic Access Demo");
    println!("--------------------");

    let mut cache = AdaptiveCache::new(
        3,
        ControllerKind::Static(PolicyType::Recency),
        Hyperparameters::default(),
    )?;

    for key in ["a", "b", "c", "a", "d"] {
        let result = cache.access(key, Some(format!("Value-{key}")))?;
        println!(
            "  access {key}: {:?} value={:?} evicted={:?}",
            result.outcome, result.value, result.evicted
        );
    }
    println!("  snapshot (least to most recent): {:?}\n", cache.snapshot());
    Ok(())
}

/// Demonstrates that a switch keeps every cached key
fn demo_manual_switch() -> Result<(), CacheError> {
    println!("2. Policy Switch Demo");
    println!("---------------------");

    let params = Hyperparameters::for_kind(ControllerKind::DoubleQ).with_seed(1);
    let mut cache: AdaptiveCache<u32, ()> = AdaptiveCache::new(4, ControllerKind::DoubleQ, params)?;
    for key in [1, 2, 3, 1, 1] {
        cache.access(key, None)?;
    }

    for target in [PolicyType::Arrival, PolicyType::Frequency, PolicyType::Recency] {
        cache.switch(target)?;
        let keys: Vec<_> = cache.snapshot().into_iter().map(|(k, _)| k).collect();
        println!("  now {target}: keys {keys:?}");
    }
    println!("  switch log: {:?}\n", cache.switches());
    Ok(())
}

/// Generates a trace that alternates between a looping scan and a hot set
fn phased_trace(len: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|i| {
            if (i / 2000) % 2 == 0 {
                (i % 120) as u64
            } else if rng.gen_bool(0.8) {
                1_000 + rng.gen_range(0..40)
            } else {
                10_000 + rng.gen_range(0..5_000)
            }
        })
        .collect()
}

/// Runs every controller over the same trace and prints their reports
fn demo_controller_comparison() -> Result<(), CacheError> {
    println!("3. Controller Comparison");
    println!("------------------------");

    let trace = phased_trace(10_000, 42);
    let mut kinds = ControllerKind::all().to_vec();
    kinds.extend(PolicyType::all().iter().map(|&p| ControllerKind::Static(p)));

    for kind in kinds {
        let config = CacheConfig::new(100, kind)
            .with_hyperparameters(Hyperparameters::for_kind(kind).with_seed(7));
        let mut cache: AdaptiveCache<u64, ()> = AdaptiveCache::from_config(&config)?;
        let report = cache.run(trace.iter().copied(), |_| None)?;
        println!("{report}\n");
    }
    Ok(())
}
