//! Feature vectors fed to the policy controllers.

use crate::EvictionBackend;

/// Number of values in every feature vector
pub const FEATURE_LEN: usize = 3;

/// Which signals a controller wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureScope {
    /// `[misses since switch, lifetime misses, lifetime hit ratio]`
    Policy,
    /// `[frequency, recency rank, presence]` of the key being accessed
    Key,
}

/// A fixed-length numeric feature vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Features {
    values: [f64; FEATURE_LEN],
}

impl Features {
    pub fn new(values: [f64; FEATURE_LEN]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; FEATURE_LEN] {
        &self.values
    }

    pub fn dot(&self, weights: &[f64; FEATURE_LEN]) -> f64 {
        self.values
            .iter()
            .zip(weights.iter())
            .map(|(x, w)| x * w)
            .sum()
    }
}

/// Derives feature vectors from cache counters and backend state.
///
/// Extraction never mutates anything it reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Policy-level features from the cache's miss counters
    pub fn policy_features(local_misses: u64, total_misses: u64, total_accesses: u64) -> Features {
        let hit_ratio = if total_accesses > 0 {
            total_accesses.saturating_sub(total_misses) as f64 / total_accesses as f64
        } else {
            0.0
        };
        Features::new([local_misses as f64, total_misses as f64, hit_ratio])
    }

    /// Per-key features for eviction prediction
    ///
    /// Recency rank is `len - position`, so the oldest queued key scores
    /// highest and absent keys score 0.
    pub fn key_features<K, V>(backend: &dyn EvictionBackend<K, V>, key: &K) -> Features {
        match backend.peek(key) {
            Some(entry) => {
                let recency = backend
                    .position(key)
                    .map(|pos| backend.len() - pos)
                    .unwrap_or(0);
                Features::new([entry.frequency as f64, recency as f64, 1.0])
            }
            None => Features::default(),
        }
    }

    /// Features for the given scope
    pub fn extract<K, V>(
        scope: FeatureScope,
        backend: &dyn EvictionBackend<K, V>,
        key: &K,
        local_misses: u64,
        total_misses: u64,
        total_accesses: u64,
    ) -> Features {
        match scope {
            FeatureScope::Policy => {
                Self::policy_features(local_misses, total_misses, total_accesses)
            }
            FeatureScope::Key => Self::key_features(backend, key),
        }
    }
}
