//! Eviction backend implementations
//!
//! This module contains the three eviction disciplines an adaptive cache can
//! run. Each one implements the `EvictionBackend` trait and owns its entries
//! outright; the adaptive cache holds exactly one of them at a time and moves
//! entries between them when the controller asks for a switch.

use std::fmt;

use crate::EvictionBackend;

pub mod fifo;
pub mod lfu;
pub mod lru;

pub use fifo::ArrivalBackend;
pub use lfu::FrequencyBackend;
pub use lru::RecencyBackend;

/// Enumeration of the eviction disciplines
///
/// The discriminant doubles as the row/column index in the controllers'
/// learned tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PolicyType {
    /// Least Recently Used - evicts the entry touched longest ago
    Recency,
    /// First In, First Out - evicts the oldest inserted entry, hits ignored
    Arrival,
    /// Least Frequently Used - evicts the least used entry, oldest first on ties
    Frequency,
}

impl PolicyType {
    /// Returns a human-readable name for the policy
    pub fn name(&self) -> &'static str {
        match self {
            PolicyType::Recency => "LRU",
            PolicyType::Arrival => "FIFO",
            PolicyType::Frequency => "LFU",
        }
    }

    /// Returns a description of the policy's behavior
    pub fn description(&self) -> &'static str {
        match self {
            PolicyType::Recency => "Evicts the least recently used item",
            PolicyType::Arrival => "Evicts items in first-in-first-out order",
            PolicyType::Frequency => "Evicts the least frequently used item",
        }
    }

    /// Returns all policy types in table order
    pub fn all() -> &'static [PolicyType] {
        &[PolicyType::Recency, PolicyType::Arrival, PolicyType::Frequency]
    }

    /// Table index of this policy
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`PolicyType::index`]
    pub fn from_index(index: usize) -> Option<PolicyType> {
        Self::all().get(index).copied()
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cached key/value pair plus the metadata every discipline needs.
///
/// An entry is owned by exactly one backend at a time. Switching backends
/// moves it, carrying `insertion_order` along so arrival order survives.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    /// Number of uses seen by the current backend (starts at 1)
    pub frequency: u64,
    /// Position in the global arrival sequence
    pub insertion_order: u64,
}

impl<K, V> CacheEntry<K, V> {
    pub fn new(key: K, value: V, insertion_order: u64) -> Self {
        Self {
            key,
            value,
            frequency: 1,
            insertion_order,
        }
    }
}

/// Factory function to create an empty backend for a policy
///
/// A zero capacity is accepted here; such a backend rejects every `put`
/// with `CacheError::Capacity`.
pub fn create_backend<K, V>(
    policy_type: PolicyType,
    capacity: usize,
) -> Box<dyn EvictionBackend<K, V>>
where
    K: std::hash::Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    match policy_type {
        PolicyType::Recency => Box::new(RecencyBackend::new(capacity)),
        PolicyType::Arrival => Box::new(ArrivalBackend::new(capacity)),
        PolicyType::Frequency => Box::new(FrequencyBackend::new(capacity)),
    }
}
