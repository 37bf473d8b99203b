//! The adaptive cache: one live backend, one controller, and the switch
//! protocol that moves entries between backends.

use std::fmt;
use std::hash::Hash;

use tracing::{debug, info, trace};

use crate::config::{CacheConfig, Hyperparameters};
use crate::controller::{ControllerKind, Decision, Feedback, RegimeSignal, create_controller};
use crate::error::CacheError;
use crate::features::{FeatureExtractor, FeatureScope};
use crate::policies::{PolicyType, create_backend};
use crate::shadow::ShadowSet;
use crate::{CacheStats, EvictionBackend, PolicyController, PredictionStats};

/// Whether an access was served from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Miss,
}

/// Result of a single access
#[derive(Debug, Clone, PartialEq)]
pub struct AccessResult<K, V> {
    pub outcome: Outcome,
    /// The cached value on a hit (possibly stale), the supplied value on a miss
    pub value: Option<V>,
    /// Key evicted to make room, if any
    pub evicted: Option<K>,
}

impl<K, V> AccessResult<K, V> {
    pub fn is_hit(&self) -> bool {
        self.outcome == Outcome::Hit
    }
}

/// One completed backend switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SwitchEvent {
    /// Lifetime access count at the time of the switch
    pub at_access: u64,
    pub from: PolicyType,
    pub to: PolicyType,
    /// Entries moved into the new backend
    pub migrated: usize,
}

/// Summary of a trace replay
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Report {
    pub controller: &'static str,
    pub capacity: usize,
    pub stats: CacheStats,
    pub final_policy: PolicyType,
    pub switches: Vec<SwitchEvent>,
}

impl Report {
    pub fn hit_percentage(&self) -> f64 {
        self.stats.hit_ratio() * 100.0
    }

    pub fn miss_percentage(&self) -> f64 {
        self.stats.miss_ratio() * 100.0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Controller: {} (capacity {})", self.controller, self.capacity)?;
        writeln!(f, "Total number of traces: {}", self.stats.total_accesses)?;
        writeln!(
            f,
            "Total Cache Misses: {} ({:.2}%)",
            self.stats.misses,
            self.miss_percentage()
        )?;
        writeln!(
            f,
            "Total Cache Hits: {} ({:.2}%)",
            self.stats.hits,
            self.hit_percentage()
        )?;
        if let Some(prediction) = self.stats.prediction {
            writeln!(f, "False Positives: {}", prediction.false_positives)?;
            writeln!(f, "False Negatives: {}", prediction.false_negatives)?;
        }
        write!(
            f,
            "Final policy: {} after {} switches",
            self.final_policy,
            self.switches.len()
        )
    }
}

/// Fixed-capacity cache whose eviction discipline is chosen online.
///
/// Exactly one backend is live at a time. Every access is routed through
/// the controller, which may trigger a switch: the live backend's entries
/// are exported, a fresh backend of the target discipline is built from
/// them, and the old backend is dropped. A switch either completes or
/// leaves the cache untouched.
///
/// Selecting controllers are rewarded from key-only shadow directories,
/// one per candidate discipline, so the reward for choosing a policy is
/// what that policy would have scored on the same access stream.
///
/// Values are stored as `Option<V>` so keys can be tracked without a
/// payload, the way address traces are replayed.
pub struct AdaptiveCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    capacity: usize,
    backend: Box<dyn EvictionBackend<K, Option<V>>>,
    controller: Box<dyn PolicyController>,
    shadows: ShadowSet<K>,
    stats: CacheStats,
    /// Misses since the last switch
    local_misses: u64,
    /// Accesses since the last switch
    local_accesses: u64,
    preserve_frequency: bool,
    switch_log: Vec<SwitchEvent>,
}

impl<K, V> AdaptiveCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    /// Creates a cache driven by one of the built-in controllers
    ///
    /// Fails with `CacheError::Config` when `capacity` is 0 or a
    /// hyperparameter is out of range.
    pub fn new(
        capacity: usize,
        controller: ControllerKind,
        hyperparameters: Hyperparameters,
    ) -> Result<Self, CacheError> {
        Self::from_config(
            &CacheConfig::new(capacity, controller).with_hyperparameters(hyperparameters),
        )
    }

    /// Creates a cache from a full configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let params = config.resolved_hyperparameters();
        let controller = create_controller(config.controller, &params)?;
        let mut cache =
            Self::with_controller(config.capacity, controller, params.preserve_frequency_on_switch)?;
        if config.controller == ControllerKind::Predictor {
            cache.stats.prediction = Some(PredictionStats::default());
        }
        Ok(cache)
    }

    /// Creates a cache around any controller implementation
    pub fn with_controller(
        capacity: usize,
        controller: Box<dyn PolicyController>,
        preserve_frequency: bool,
    ) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::config("capacity must be greater than 0"));
        }
        let backend = create_backend(controller.active(), capacity);
        let candidates = controller.candidates();
        let shadows = if controller.feature_scope() == FeatureScope::Policy && candidates.len() > 1 {
            ShadowSet::new(candidates, capacity)
        } else {
            ShadowSet::empty()
        };
        Ok(Self {
            capacity,
            backend,
            controller,
            shadows,
            stats: CacheStats::default(),
            local_misses: 0,
            local_accesses: 0,
            preserve_frequency,
            switch_log: Vec::new(),
        })
    }

    /// Serves one access.
    ///
    /// On a miss the key is inserted with `value` (unless an eviction gate
    /// refuses admission). The controller then gets its regime check, which
    /// may switch backends, and learns from the outcome.
    pub fn access(&mut self, key: K, value: Option<V>) -> Result<AccessResult<K, V>, CacheError> {
        self.stats.total_accesses += 1;
        self.local_accesses += 1;

        let features = FeatureExtractor::extract(
            self.controller.feature_scope(),
            self.backend.as_ref(),
            &key,
            self.local_misses,
            self.stats.misses,
            self.stats.total_accesses,
        );
        let decision = self.controller.decide(&features);

        let store_full = self.backend.len() >= self.capacity;
        let cached = self.backend.get(&key).map(|entry| entry.value.clone());
        let (outcome, value, evicted, eviction_required) = match cached {
            Some(stored) => {
                self.stats.hits += 1;
                (Outcome::Hit, stored, None, false)
            }
            None => {
                self.stats.misses += 1;
                self.local_misses += 1;

                if let (Some(prediction), Decision::Gate { evict, .. }) =
                    (self.stats.prediction.as_mut(), &decision)
                {
                    if *evict && !store_full {
                        prediction.false_positives += 1;
                    } else if !*evict && store_full {
                        prediction.false_negatives += 1;
                    }
                }

                let evicted = if decision.admits(store_full) {
                    self.backend.put(key.clone(), value.clone())?
                } else {
                    self.stats.bypassed += 1;
                    None
                };
                if let Some(victim) = &evicted {
                    self.stats.evictions += 1;
                    debug!(policy = %self.backend.policy(), key = ?victim, "evicted entry");
                }
                (Outcome::Miss, value, evicted, store_full)
            }
        };
        self.shadows.observe(&key)?;

        let signal = RegimeSignal {
            local_misses: self.local_misses,
            local_accesses: self.local_accesses,
        };
        if let Some(target) = self.controller.regime_check(&signal) {
            self.switch(target)?;
        }

        let live = self.backend.policy();
        let (hit, impact) = match decision {
            Decision::Select(policy) => match self.shadows.last_hit(policy) {
                // the shadow always holds the key once the access is replayed
                Some(hit) => (hit, miss_impact(policy, true)),
                None => (outcome == Outcome::Hit, miss_impact(live, self.backend.contains(&key))),
            },
            Decision::Gate { .. } => (outcome == Outcome::Hit, miss_impact(live, self.backend.contains(&key))),
        };
        let feedback = Feedback {
            hit,
            impact,
            eviction_required,
            next_state: self.controller.active(),
        };
        self.controller.update(&decision, &features, &feedback);
        self.controller.decay();

        trace!(
            key = ?key,
            outcome = ?outcome,
            policy = %self.backend.policy(),
            "access"
        );
        Ok(AccessResult {
            outcome,
            value,
            evicted,
        })
    }

    /// Moves every entry into a fresh backend of the `target` discipline.
    ///
    /// Entries are inserted in arrival order. Migrating into LFU resets use
    /// counts to 1 unless `preserve_frequency_on_switch` was set. The old
    /// backend is dropped only once the new one is complete, so a failure
    /// leaves the cache as it was. Switching to the live discipline is a
    /// no-op.
    pub fn switch(&mut self, target: PolicyType) -> Result<(), CacheError> {
        let from = self.backend.policy();
        if target == from {
            return Ok(());
        }
        if !self.controller.candidates().contains(&target) {
            return Err(CacheError::config(format!(
                "{} controller cannot run the {target} policy",
                self.controller.kind().name()
            )));
        }

        let mut entries = self.backend.export_entries();
        entries.sort_by_key(|entry| entry.insertion_order);
        let migrated = entries.len();

        let mut next = create_backend(target, self.capacity);
        for mut entry in entries {
            if target == PolicyType::Frequency && !self.preserve_frequency {
                entry.frequency = 1;
            }
            next.import_entry(entry)?;
        }
        if next.len() != migrated {
            return Err(CacheError::consistency(
                target,
                format!("migrated {} of {migrated} entries", next.len()),
            ));
        }
        if cfg!(debug_assertions) {
            next.verify()?;
        }

        self.backend = next;
        self.local_misses = 0;
        self.local_accesses = 0;
        self.stats.switches += 1;
        self.controller.on_switch(target);

        let event = SwitchEvent {
            at_access: self.stats.total_accesses,
            from,
            to: target,
            migrated,
        };
        info!(
            from = %from,
            to = %target,
            migrated,
            at_access = event.at_access,
            "switched eviction policy"
        );
        self.switch_log.push(event);
        Ok(())
    }

    /// Replays a key sequence, asking `value_for` for each key's value
    pub fn run<I, F>(&mut self, trace: I, mut value_for: F) -> Result<Report, CacheError>
    where
        I: IntoIterator<Item = K>,
        F: FnMut(&K) -> Option<V>,
    {
        for key in trace {
            let value = value_for(&key);
            self.access(key, value)?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> Report {
        Report {
            controller: self.controller.kind().name(),
            capacity: self.capacity,
            stats: self.stats.clone(),
            final_policy: self.policy(),
            switches: self.switch_log.clone(),
        }
    }

    /// Entries in the live backend's iteration order
    ///
    /// LRU lists least to most recent; FIFO and LFU list in arrival order.
    pub fn snapshot(&self) -> Vec<(K, Option<V>)> {
        self.backend
            .export_entries()
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The live eviction discipline
    pub fn policy(&self) -> PolicyType {
        self.backend.policy()
    }

    pub fn controller(&self) -> &dyn PolicyController {
        self.controller.as_ref()
    }

    pub fn switches(&self) -> &[SwitchEvent] {
        &self.switch_log
    }

    /// Hit ratio `policy` would have achieved had it run from the start
    ///
    /// `None` when the controller does not select between policies.
    pub fn shadow_hit_ratio(&self, policy: PolicyType) -> Option<f64> {
        self.shadows.hit_ratio(policy)
    }

    /// Misses since the last switch
    pub fn local_misses(&self) -> u64 {
        self.local_misses
    }

    pub fn contains(&self, key: &K) -> bool {
        self.backend.contains(key)
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks the live backend's and the shadow directories' invariants
    pub fn verify(&self) -> Result<(), CacheError> {
        self.backend.verify()?;
        self.shadows.verify()
    }
}

/// A miss costs double when the key sits in an LRU store afterwards
fn miss_impact(policy: PolicyType, resident: bool) -> u8 {
    if policy == PolicyType::Recency && resident { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn quiet(kind: ControllerKind) -> Hyperparameters {
        Hyperparameters::for_kind(kind)
            .with_seed(11)
            .with_miss_threshold(1_000)
    }

    fn cache(capacity: usize, kind: ControllerKind) -> AdaptiveCache<String, String> {
        AdaptiveCache::new(capacity, kind, quiet(kind)).unwrap()
    }

    fn access(cache: &mut AdaptiveCache<String, String>, key: &str) -> Outcome {
        cache
            .access(key.to_string(), Some(format!("Value-{key}")))
            .unwrap()
            .outcome
    }

    fn keys(cache: &AdaptiveCache<String, String>) -> Vec<String> {
        cache.snapshot().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result: Result<AdaptiveCache<u32, u32>, _> =
            AdaptiveCache::new(0, ControllerKind::DoubleQ, Hyperparameters::default());
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_fifo_scenario() {
        let mut cache = cache(2, ControllerKind::DoubleQ);
        cache.switch(PolicyType::Arrival).unwrap();

        let outcomes: Vec<_> = ["a", "b", "a", "c"]
            .into_iter()
            .map(|k| access(&mut cache, k))
            .collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Miss, Outcome::Miss, Outcome::Hit, Outcome::Miss]
        );
        assert_eq!(
            cache.snapshot(),
            vec![
                ("b".to_string(), Some("Value-b".to_string())),
                ("c".to_string(), Some("Value-c".to_string())),
            ]
        );
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_hit_returns_stored_value_and_reports_eviction() {
        let mut cache = cache(1, ControllerKind::Static(PolicyType::Recency));
        cache.access("k".to_string(), Some("old".to_string())).unwrap();

        let hit = cache.access("k".to_string(), Some("new".to_string())).unwrap();
        assert!(hit.is_hit());
        assert_eq!(hit.value.as_deref(), Some("old"));

        let miss = cache.access("j".to_string(), None).unwrap();
        assert_eq!(miss.outcome, Outcome::Miss);
        assert_eq!(miss.evicted.as_deref(), Some("k"));
        assert_eq!(cache.snapshot(), vec![("j".to_string(), None)]);
    }

    #[test]
    fn test_recency_hit_protects_key() {
        let mut cache = cache(3, ControllerKind::Static(PolicyType::Recency));
        for k in ["a", "b", "c", "a"] {
            access(&mut cache, k);
        }
        let result = cache.access("d".to_string(), None).unwrap();
        assert_eq!(result.evicted.as_deref(), Some("b"));
        assert_eq!(keys(&cache), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_frequency_baseline_evicts_oldest_of_least_used() {
        let mut cache = cache(3, ControllerKind::Static(PolicyType::Frequency));
        for k in ["a", "b", "c", "a", "c"] {
            access(&mut cache, k);
        }
        let result = cache.access("d".to_string(), None).unwrap();
        assert_eq!(result.evicted.as_deref(), Some("b"));
    }

    #[test]
    fn test_switch_moves_every_key_once() {
        let mut cache = cache(8, ControllerKind::DoubleQ);
        for k in ["a", "b", "c", "d", "e"] {
            access(&mut cache, k);
        }
        access(&mut cache, "b");
        access(&mut cache, "b");
        let before: HashSet<_> = keys(&cache).into_iter().collect();
        let stats_before = cache.stats().clone();

        for target in [
            PolicyType::Frequency,
            PolicyType::Arrival,
            PolicyType::Recency,
            PolicyType::Frequency,
        ] {
            cache.switch(target).unwrap();
            assert_eq!(cache.policy(), target);
            assert_eq!(cache.controller().active(), target);
            assert_eq!(cache.local_misses(), 0);
            let after = keys(&cache);
            assert_eq!(after.len(), before.len());
            assert_eq!(after.into_iter().collect::<HashSet<_>>(), before);
            cache.verify().unwrap();
        }

        assert_eq!(cache.stats().total_accesses, stats_before.total_accesses);
        assert_eq!(cache.stats().misses, stats_before.misses);
        assert_eq!(cache.stats().switches, 4);
        assert_eq!(cache.switches().len(), 4);
        assert_eq!(cache.switches()[0].migrated, 5);
    }

    #[test]
    fn test_switch_into_lfu_resets_frequency() {
        let mut cache = cache(4, ControllerKind::DoubleQ);
        for k in ["a", "a", "a", "b"] {
            access(&mut cache, k);
        }
        cache.switch(PolicyType::Frequency).unwrap();
        assert!(cache.backend.export_entries().iter().all(|e| e.frequency == 1));

        // with counts reset, "a" is now the oldest entry at the minimum
        access(&mut cache, "b");
        access(&mut cache, "c");
        access(&mut cache, "d");
        let result = cache.access("e".to_string(), None).unwrap();
        assert_eq!(result.evicted.as_deref(), Some("a"));
    }

    #[test]
    fn test_preserved_frequency_survives_switch() {
        let params = quiet(ControllerKind::DoubleQ);
        let params = Hyperparameters {
            preserve_frequency_on_switch: true,
            ..params
        };
        let mut cache: AdaptiveCache<String, String> =
            AdaptiveCache::new(4, ControllerKind::DoubleQ, params).unwrap();
        for k in ["a", "a", "a", "b"] {
            access(&mut cache, k);
        }
        cache.switch(PolicyType::Frequency).unwrap();
        let a = cache
            .backend
            .export_entries()
            .into_iter()
            .find(|e| e.key == "a")
            .map(|e| e.frequency);
        assert_eq!(a, Some(3));
    }

    #[test]
    fn test_switch_rebuilds_in_arrival_order() {
        let mut cache = cache(4, ControllerKind::DoubleQ);
        for k in ["a", "b", "c", "a"] {
            access(&mut cache, k);
        }
        assert_eq!(keys(&cache), vec!["b", "c", "a"]);

        cache.switch(PolicyType::Arrival).unwrap();
        assert_eq!(keys(&cache), vec!["a", "b", "c"]);

        cache.switch(PolicyType::Recency).unwrap();
        assert_eq!(keys(&cache), vec!["a", "b", "c"]);

        // fresh inserts continue the arrival sequence
        access(&mut cache, "d");
        cache.switch(PolicyType::Arrival).unwrap();
        assert_eq!(keys(&cache), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_switch_to_unsupported_policy_is_rejected() {
        let mut cache = cache(4, ControllerKind::SingleQ);
        access(&mut cache, "a");
        let err = cache.switch(PolicyType::Frequency).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
        assert_eq!(cache.policy(), PolicyType::Recency);
        assert_eq!(keys(&cache), vec!["a"]);
    }

    #[test]
    fn test_single_q_switches_after_threshold() {
        let params = Hyperparameters::for_kind(ControllerKind::SingleQ)
            .with_seed(3)
            .with_miss_threshold(3);
        let mut cache: AdaptiveCache<u32, ()> =
            AdaptiveCache::new(16, ControllerKind::SingleQ, params).unwrap();

        for key in 0..4 {
            cache.access(key, None).unwrap();
        }
        assert_eq!(cache.policy(), PolicyType::Arrival);
        assert_eq!(cache.local_misses(), 0);
        assert_eq!(
            cache.switches(),
            &[SwitchEvent {
                at_access: 4,
                from: PolicyType::Recency,
                to: PolicyType::Arrival,
                migrated: 4,
            }]
        );
        assert_eq!(cache.stats().misses, 4);

        for key in 4..8 {
            cache.access(key, None).unwrap();
        }
        assert_eq!(cache.policy(), PolicyType::Recency);
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_invariants_hold_for_every_controller() {
        let mut kinds = ControllerKind::all().to_vec();
        kinds.extend(PolicyType::all().iter().map(|&p| ControllerKind::Static(p)));

        for kind in kinds {
            let params = Hyperparameters::for_kind(kind).with_seed(21);
            let mut cache: AdaptiveCache<u32, u32> = AdaptiveCache::new(8, kind, params).unwrap();
            let mut rng = StdRng::seed_from_u64(99);

            for i in 0..2_000u64 {
                // a hot set of 6 keys mixed with a cold scan
                let key = if rng.gen_bool(0.6) {
                    rng.gen_range(0..6)
                } else {
                    100 + (i % 500) as u32
                };
                cache.access(key, Some(key)).unwrap();
                assert!(cache.len() <= cache.capacity(), "{kind:?} overflowed");
            }
            cache.verify().unwrap();

            let stats = cache.stats();
            assert_eq!(stats.total_accesses, 2_000);
            assert_eq!(stats.hits + stats.misses, stats.total_accesses);
            assert_eq!(
                stats.misses,
                stats.bypassed + stats.evictions + cache.len() as u64,
                "{kind:?} lost track of entries"
            );
            assert_eq!(stats.switches, cache.switches().len() as u64);
        }
    }

    #[test]
    fn test_predictor_tracks_prediction_errors() {
        let params = Hyperparameters::for_kind(ControllerKind::Predictor).with_seed(8);
        let mut cache: AdaptiveCache<u32, ()> =
            AdaptiveCache::new(4, ControllerKind::Predictor, params).unwrap();
        assert!(cache.stats().prediction.is_some());

        for key in 0..200 {
            cache.access(key, None).unwrap();
            assert!(cache.len() <= 4);
        }
        let stats = cache.stats();
        let prediction = stats.prediction.unwrap_or_default();
        assert!(prediction.false_positives + prediction.false_negatives <= stats.misses);
        assert_eq!(cache.policy(), PolicyType::Recency);
        assert!(cache.switches().is_empty());

        // the store fills, so the gate must eventually learn to evict
        assert!(stats.evictions > 0);
    }

    /// Warms a hot set of three keys, then interleaves it with one-off keys
    /// so that every hot key is pushed out of LRU and FIFO before it returns
    /// while LFU holds on to it by count.
    fn hot_set_with_scan(len: u64) -> Vec<u64> {
        let mut trace: Vec<u64> = (0..30).map(|i| i % 3).collect();
        let mut cold = 1_000;
        while (trace.len() as u64) < len {
            for slot in [Some(0), Some(1), None, Some(2), None] {
                trace.push(slot.unwrap_or_else(|| {
                    cold += 1;
                    cold
                }));
            }
        }
        trace.truncate(len as usize);
        trace
    }

    #[test]
    fn test_double_q_converges_on_frequency_for_hot_set() {
        for seed in 0..5 {
            let params = Hyperparameters::for_kind(ControllerKind::DoubleQ).with_seed(seed);
            let mut cache: AdaptiveCache<u64, ()> =
                AdaptiveCache::new(4, ControllerKind::DoubleQ, params).unwrap();
            cache.run(hot_set_with_scan(5_000), |_| None).unwrap();

            let lfu = cache.shadow_hit_ratio(PolicyType::Frequency).unwrap();
            assert!(lfu > cache.shadow_hit_ratio(PolicyType::Recency).unwrap());
            assert!(lfu > cache.shadow_hit_ratio(PolicyType::Arrival).unwrap());

            let probs = cache.controller().selection_probabilities();
            let share = |policy: PolicyType| {
                probs
                    .iter()
                    .find(|(p, _)| *p == policy)
                    .map(|(_, share)| *share)
                    .unwrap_or_default()
            };
            let frequency = share(PolicyType::Frequency);
            assert!(frequency > share(PolicyType::Recency), "seed {seed}: {probs:?}");
            assert!(frequency > share(PolicyType::Arrival), "seed {seed}: {probs:?}");
            cache.verify().unwrap();
        }
    }

    #[test]
    fn test_shadows_only_for_selecting_controllers() {
        let pinned = cache(4, ControllerKind::Static(PolicyType::Recency));
        assert_eq!(pinned.shadow_hit_ratio(PolicyType::Recency), None);

        let gate: AdaptiveCache<u32, ()> = AdaptiveCache::new(
            4,
            ControllerKind::Predictor,
            Hyperparameters::for_kind(ControllerKind::Predictor).with_seed(1),
        )
        .unwrap();
        assert_eq!(gate.shadow_hit_ratio(PolicyType::Recency), None);

        let mut single = cache(2, ControllerKind::SingleQ);
        for k in ["a", "b", "a", "c", "a"] {
            access(&mut single, k);
        }
        assert_eq!(single.shadow_hit_ratio(PolicyType::Recency), Some(0.4));
        assert_eq!(single.shadow_hit_ratio(PolicyType::Arrival), Some(0.2));
        assert_eq!(single.shadow_hit_ratio(PolicyType::Frequency), None);
    }

    #[test]
    fn test_run_produces_report() {
        let mut cache: AdaptiveCache<u32, String> = AdaptiveCache::new(
            4,
            ControllerKind::Static(PolicyType::Arrival),
            Hyperparameters::default(),
        )
        .unwrap();
        let report = cache
            .run([1, 2, 1, 3, 1, 4], |k| Some(format!("Value-{k}")))
            .unwrap();

        assert_eq!(report.stats.total_accesses, 6);
        assert_eq!(report.stats.hits, 2);
        assert!((report.hit_percentage() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.final_policy, PolicyType::Arrival);

        let text = report.to_string();
        assert!(text.contains("Total number of traces: 6"));
        assert!(text.contains("Total Cache Hits: 2 (33.33%)"));
        assert!(!text.contains("False Positives"));
    }
}
