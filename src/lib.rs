// Exported modules of the crate
pub mod adaptive;
pub mod config;
pub mod controller;
pub mod error;
pub mod features;
pub mod policies;
pub mod shadow;
pub mod trace;

pub use adaptive::{AccessResult, AdaptiveCache, Outcome, Report, SwitchEvent};
pub use config::{CacheConfig, Hyperparameters};
pub use controller::{ControllerKind, Decision, Feedback, RegimeSignal};
pub use error::CacheError;
pub use features::{FeatureExtractor, FeatureScope, Features};
pub use policies::{CacheEntry, PolicyType};

/// Core trait defining eviction backend behavior
///
/// A backend owns a capacity-bounded set of entries and decides which one
/// leaves when room is needed. The adaptive cache holds exactly one backend
/// at a time and migrates entries between backends through
/// `export_entries`/`import_entry`.
pub trait EvictionBackend<K, V> {
    /// The discipline this backend implements
    fn policy(&self) -> PolicyType;

    /// Retrieve an entry, applying the discipline's hit bookkeeping
    fn get(&mut self, key: &K) -> Option<&CacheEntry<K, V>>;

    /// Retrieve an entry without touching any bookkeeping
    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>>;

    /// Check whether a key is resident
    fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Insert a key-value pair, evicting one entry first if the store is full
    ///
    /// Returns the evicted key, if any. Fails with `CacheError::Capacity`
    /// only when the capacity is zero.
    fn put(&mut self, key: K, value: V) -> Result<Option<K>, CacheError>;

    /// Remove exactly one entry according to the discipline's tie-break rule
    fn evict_one(&mut self) -> Result<Option<K>, CacheError>;

    /// Snapshot every entry in the backend's iteration order
    fn export_entries(&self) -> Vec<CacheEntry<K, V>>;

    /// Append a migrated entry, keeping its frequency and insertion order
    fn import_entry(&mut self, entry: CacheEntry<K, V>) -> Result<(), CacheError>;

    /// Index of a key in iteration order (0 = next eviction candidate for
    /// Recency and Arrival, oldest insertion for Frequency)
    fn position(&self, key: &K) -> Option<usize>;

    /// Return current number of entries
    fn len(&self) -> usize;

    /// Check if the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the maximum allowed number of entries
    fn capacity(&self) -> usize;

    /// Remove all entries
    fn clear(&mut self);

    /// Check the discipline's structural invariants
    fn verify(&self) -> Result<(), CacheError>;
}

/// Trait for learned controllers arbitrating between eviction disciplines.
///
/// The adaptive cache consults its controller on every access: first for a
/// decision, then for a regime check that may trigger a backend switch, and
/// finally with feedback so the controller can learn from the outcome.
pub trait PolicyController {
    /// Which strategy this is
    fn kind(&self) -> ControllerKind;

    /// Which features the controller consumes
    fn feature_scope(&self) -> FeatureScope {
        FeatureScope::Policy
    }

    /// Disciplines this controller may make active
    fn candidates(&self) -> &'static [PolicyType] {
        PolicyType::all()
    }

    /// The discipline the controller currently considers active
    fn active(&self) -> PolicyType;

    /// Choose a policy or predict an eviction for the upcoming access
    fn decide(&mut self, features: &Features) -> Decision;

    /// Decide whether observed performance warrants a switch
    fn regime_check(&mut self, _signal: &RegimeSignal) -> Option<PolicyType> {
        None
    }

    /// Learn from the outcome of the access that `decision` was made for
    fn update(&mut self, decision: &Decision, features: &Features, feedback: &Feedback);

    /// Record that the cache now runs `target`
    fn on_switch(&mut self, target: PolicyType);

    /// Decay exploration after an access, if the strategy explores
    fn decay(&mut self) {}

    /// Probability of selecting each candidate in the active state
    ///
    /// Non-exploring strategies put all the mass on the active policy.
    fn selection_probabilities(&self) -> Vec<(PolicyType, f64)> {
        let active = self.active();
        self.candidates()
            .iter()
            .map(|&policy| (policy, if policy == active { 1.0 } else { 0.0 }))
            .collect()
    }
}

/// Struct holding statistics about cache usage and performance
///
/// Every counter only ever grows; switches leave them untouched.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CacheStats {
    pub total_accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub switches: u64,
    /// Misses served without being admitted (eviction predictor only)
    pub bypassed: u64,
    /// Eviction-prediction quality, present for the predictor strategy
    pub prediction: Option<PredictionStats>,
}

/// False positive / false negative counts for eviction predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PredictionStats {
    /// Eviction predicted although the store had room
    pub false_positives: u64,
    /// No eviction predicted although the store was full
    pub false_negatives: u64,
}

impl CacheStats {
    /// Calculate hit ratio (ratio of cache hits to total accesses)
    pub fn hit_ratio(&self) -> f64 {
        if self.total_accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_accesses as f64
        }
    }

    /// Calculate miss ratio, 0 before the first access
    pub fn miss_ratio(&self) -> f64 {
        if self.total_accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.total_accesses as f64
        }
    }
}

// Convenient re-exports for common types and modules
pub mod prelude {
    pub use super::{
        AccessResult, AdaptiveCache, CacheConfig, CacheError, CacheStats, ControllerKind,
        EvictionBackend, Hyperparameters, Outcome, PolicyController, PolicyType, Report,
    };
    pub use super::policies::{ArrivalBackend, FrequencyBackend, RecencyBackend};
}
