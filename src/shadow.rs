//! Key-only shadow directories.
//!
//! Each candidate discipline gets a capacity-bounded directory of keys that
//! sees every access, so the controller can be rewarded for what the policy
//! it selected would have done, not only for what the live backend did.

use std::hash::Hash;

use crate::error::CacheError;
use crate::policies::{PolicyType, create_backend};
use crate::EvictionBackend;

struct Shadow<K> {
    directory: Box<dyn EvictionBackend<K, ()>>,
    last_hit: Option<bool>,
    hits: u64,
}

/// One ghost directory per candidate discipline
pub struct ShadowSet<K>
where
    K: Hash + Eq + Clone + 'static,
{
    shadows: Vec<Shadow<K>>,
    accesses: u64,
}

impl<K> ShadowSet<K>
where
    K: Hash + Eq + Clone + 'static,
{
    pub fn new(policies: &[PolicyType], capacity: usize) -> Self {
        let shadows = policies
            .iter()
            .map(|&policy| Shadow {
                directory: create_backend(policy, capacity),
                last_hit: None,
                hits: 0,
            })
            .collect();
        Self {
            shadows,
            accesses: 0,
        }
    }

    /// A set that tracks nothing
    pub fn empty() -> Self {
        Self::new(&[], 0)
    }

    pub fn is_empty(&self) -> bool {
        self.shadows.is_empty()
    }

    /// Replays one access on every directory
    pub fn observe(&mut self, key: &K) -> Result<(), CacheError> {
        if self.shadows.is_empty() {
            return Ok(());
        }
        self.accesses += 1;
        for shadow in &mut self.shadows {
            let hit = shadow.directory.get(key).is_some();
            if hit {
                shadow.hits += 1;
            } else {
                shadow.directory.put(key.clone(), ())?;
            }
            shadow.last_hit = Some(hit);
        }
        Ok(())
    }

    fn find(&self, policy: PolicyType) -> Option<&Shadow<K>> {
        self.shadows
            .iter()
            .find(|shadow| shadow.directory.policy() == policy)
    }

    /// Whether `policy` would have hit the last observed access
    pub fn last_hit(&self, policy: PolicyType) -> Option<bool> {
        self.find(policy).and_then(|shadow| shadow.last_hit)
    }

    /// Lifetime hit ratio `policy` would have achieved on its own
    pub fn hit_ratio(&self, policy: PolicyType) -> Option<f64> {
        let shadow = self.find(policy)?;
        Some(if self.accesses == 0 {
            0.0
        } else {
            shadow.hits as f64 / self.accesses as f64
        })
    }

    /// Checks every directory's invariants
    pub fn verify(&self) -> Result<(), CacheError> {
        self.shadows
            .iter()
            .try_for_each(|shadow| shadow.directory.verify())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_directory_follows_its_discipline() {
        let mut set = ShadowSet::new(PolicyType::all(), 2);
        for key in ["a", "b", "a", "c", "a"] {
            set.observe(&key).unwrap();
        }
        // LRU kept "a" warm; FIFO evicted it for "c"; LFU kept it on count
        assert_eq!(set.last_hit(PolicyType::Recency), Some(true));
        assert_eq!(set.last_hit(PolicyType::Arrival), Some(false));
        assert_eq!(set.last_hit(PolicyType::Frequency), Some(true));
        assert_eq!(set.hit_ratio(PolicyType::Recency), Some(0.4));
        assert_eq!(set.hit_ratio(PolicyType::Arrival), Some(0.2));
        set.verify().unwrap();
    }

    #[test]
    fn test_untracked_policy() {
        let mut set = ShadowSet::new(&[PolicyType::Recency, PolicyType::Arrival], 4);
        set.observe(&1).unwrap();
        assert_eq!(set.last_hit(PolicyType::Frequency), None);
        assert_eq!(set.hit_ratio(PolicyType::Frequency), None);

        let mut empty: ShadowSet<i32> = ShadowSet::empty();
        assert!(empty.is_empty());
        empty.observe(&1).unwrap();
        assert_eq!(empty.last_hit(PolicyType::Recency), None);
    }
}
