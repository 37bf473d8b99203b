use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use super::{CacheEntry, PolicyType};
use crate::{CacheError, EvictionBackend};

/// A First-In-First-Out (FIFO) backend.
///
/// # Overview
/// - Evicts the oldest inserted entry when capacity is reached.
/// - Hits never change the eviction order.
/// - O(1) `get`, `put` and `evict_one`; `position` is O(n).
pub struct ArrivalBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Primary key-value store
    map: HashMap<K, CacheEntry<K, V>>,

    /// Queue to keep track of insertion order (oldest -> newest)
    order: VecDeque<K>,

    /// Maximum number of items that can be stored
    capacity: usize,

    next_order: u64,
}

impl<K, V> ArrivalBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty FIFO backend holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            next_order: 0,
        }
    }
}

impl<K, V> EvictionBackend<K, V> for ArrivalBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn policy(&self) -> PolicyType {
        PolicyType::Arrival
    }

    /// Retrieve an entry. FIFO keeps no per-hit bookkeeping.
    fn get(&mut self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.map.get(key)
    }

    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.map.get(key)
    }

    /// Insert a new key-value pair.
    ///
    /// - If the key already exists, update its value without changing order.
    /// - Evicts the oldest item first if the store is full.
    fn put(&mut self, key: K, value: V) -> Result<Option<K>, CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::Capacity);
        }

        if let Some(entry) = self.map.get_mut(&key) {
            entry.value = value;
            return Ok(None);
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict_one()?
        } else {
            None
        };

        let order = self.next_order;
        self.next_order += 1;
        self.order.push_back(key.clone());
        self.map.insert(key.clone(), CacheEntry::new(key, value, order));
        Ok(evicted)
    }

    /// Evict the **oldest** key (front of the queue)
    fn evict_one(&mut self) -> Result<Option<K>, CacheError> {
        let Some(oldest_key) = self.order.front() else {
            return Ok(None);
        };
        if !self.map.contains_key(oldest_key) {
            return Err(CacheError::consistency(
                PolicyType::Arrival,
                "queue head has no map entry",
            ));
        }
        let oldest_key = self.order.pop_front();
        if let Some(key) = &oldest_key {
            self.map.remove(key);
        }
        Ok(oldest_key)
    }

    /// Entries in arrival order (oldest first)
    fn export_entries(&self) -> Vec<CacheEntry<K, V>> {
        self.order
            .iter()
            .filter_map(|key| self.map.get(key).cloned())
            .collect()
    }

    fn import_entry(&mut self, entry: CacheEntry<K, V>) -> Result<(), CacheError> {
        if self.map.contains_key(&entry.key) {
            return Err(CacheError::consistency(
                PolicyType::Arrival,
                "imported key is already resident",
            ));
        }
        if self.map.len() >= self.capacity {
            return Err(CacheError::Capacity);
        }
        self.next_order = self.next_order.max(entry.insertion_order + 1);
        self.order.push_back(entry.key.clone());
        self.map.insert(entry.key.clone(), entry);
        Ok(())
    }

    fn position(&self, key: &K) -> Option<usize> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.order.iter().position(|k| k == key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Queue contents must equal the map's key set
    fn verify(&self) -> Result<(), CacheError> {
        if self.order.len() != self.map.len() {
            return Err(CacheError::consistency(
                PolicyType::Arrival,
                format!(
                    "queue has {} keys, map has {}",
                    self.order.len(),
                    self.map.len()
                ),
            ));
        }
        if self.order.iter().any(|key| !self.map.contains_key(key)) {
            return Err(CacheError::consistency(
                PolicyType::Arrival,
                "queue holds a key missing from the map",
            ));
        }
        if self.map.len() > self.capacity {
            return Err(CacheError::consistency(PolicyType::Arrival, "over capacity"));
        }
        Ok(())
    }
}
