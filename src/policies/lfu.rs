use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::{CacheEntry, PolicyType};
use crate::{CacheError, EvictionBackend};

/// A Least Frequently Used (LFU) backend
///
/// This backend evicts the entry with the lowest use count. When several
/// entries share the minimum count, the one inserted first is evicted.
/// Each frequency owns a bucket of keys ordered by insertion order, and
/// `min_freq` always names a non-empty bucket while the store is non-empty.
pub struct FrequencyBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Maps key to its entry (value, frequency, insertion order)
    map: HashMap<K, CacheEntry<K, V>>,
    /// Maps frequency to its keys, ordered by insertion order
    freq_list: BTreeMap<u64, BTreeMap<u64, K>>,
    /// Maximum capacity of the store
    capacity: usize,
    /// Tracks the minimum frequency currently in the store for quick eviction
    min_freq: u64,
    next_order: u64,
}

impl<K, V> FrequencyBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates an empty LFU backend holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            freq_list: BTreeMap::new(),
            capacity,
            min_freq: 0,
            next_order: 0,
        }
    }

    /// Smallest frequency present, 0 when empty
    pub fn min_frequency(&self) -> u64 {
        self.min_freq
    }

    /// Helper to increment frequency of a key accessed
    fn increase_freq(&mut self, key: &K) {
        let Some(entry) = self.map.get_mut(key) else {
            return;
        };
        let old = entry.frequency;
        let order = entry.insertion_order;
        entry.frequency += 1;
        let new = entry.frequency;

        // Remove key from old frequency bucket, dropping the bucket if empty
        if let Some(bucket) = self.freq_list.get_mut(&old) {
            bucket.remove(&order);
            if bucket.is_empty() {
                self.freq_list.remove(&old);
                if old == self.min_freq {
                    self.min_freq = new;
                }
            }
        }
        self.freq_list
            .entry(new)
            .or_default()
            .insert(order, key.clone());
    }

    fn link(&mut self, entry: CacheEntry<K, V>) {
        let freq = entry.frequency;
        self.freq_list
            .entry(freq)
            .or_default()
            .insert(entry.insertion_order, entry.key.clone());
        self.min_freq = if self.map.is_empty() {
            freq
        } else {
            self.min_freq.min(freq)
        };
        self.map.insert(entry.key.clone(), entry);
    }
}

impl<K, V> EvictionBackend<K, V> for FrequencyBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn policy(&self) -> PolicyType {
        PolicyType::Frequency
    }

    /// Gets an entry by key and increases its frequency
    fn get(&mut self, key: &K) -> Option<&CacheEntry<K, V>> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.increase_freq(key);
        self.map.get(key)
    }

    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.map.get(key)
    }

    /// Inserts or updates a key-value pair
    ///
    /// Evicts the least frequently used entry first when the store is full.
    /// Updating a resident key counts as a use.
    fn put(&mut self, key: K, value: V) -> Result<Option<K>, CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::Capacity);
        }

        if let Some(entry) = self.map.get_mut(&key) {
            entry.value = value;
            self.increase_freq(&key);
            return Ok(None);
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict_one()?
        } else {
            None
        };

        let order = self.next_order;
        self.next_order += 1;
        self.link(CacheEntry::new(key, value, order));
        Ok(evicted)
    }

    /// Evicts the oldest inserted key among those with the minimum frequency
    fn evict_one(&mut self) -> Result<Option<K>, CacheError> {
        if self.map.is_empty() {
            return Ok(None);
        }

        let min = self.min_freq;
        let (order, key) = self
            .freq_list
            .get(&min)
            .and_then(|bucket| bucket.first_key_value())
            .map(|(&order, key)| (order, key.clone()))
            .ok_or_else(|| {
                CacheError::consistency(
                    PolicyType::Frequency,
                    format!("no keys filed under minimum frequency {min}"),
                )
            })?;
        // a failed eviction must leave the store untouched
        if !self.map.contains_key(&key) {
            return Err(CacheError::consistency(
                PolicyType::Frequency,
                "eviction target is absent from the store",
            ));
        }

        if let Some(bucket) = self.freq_list.get_mut(&min) {
            bucket.remove(&order);
            if bucket.is_empty() {
                self.freq_list.remove(&min);
            }
        }
        self.map.remove(&key);
        self.min_freq = self.freq_list.keys().next().copied().unwrap_or(0);
        Ok(Some(key))
    }

    /// Entries in insertion order
    fn export_entries(&self) -> Vec<CacheEntry<K, V>> {
        let mut entries: Vec<_> = self.map.values().cloned().collect();
        entries.sort_by_key(|entry| entry.insertion_order);
        entries
    }

    fn import_entry(&mut self, mut entry: CacheEntry<K, V>) -> Result<(), CacheError> {
        if self.map.contains_key(&entry.key) {
            return Err(CacheError::consistency(
                PolicyType::Frequency,
                "imported key is already resident",
            ));
        }
        if self.map.len() >= self.capacity {
            return Err(CacheError::Capacity);
        }
        entry.frequency = entry.frequency.max(1);
        self.next_order = self.next_order.max(entry.insertion_order + 1);
        self.link(entry);
        Ok(())
    }

    fn position(&self, key: &K) -> Option<usize> {
        let target = self.map.get(key)?.insertion_order;
        Some(
            self.map
                .values()
                .filter(|entry| entry.insertion_order < target)
                .count(),
        )
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.map.clear();
        self.freq_list.clear();
        self.min_freq = 0;
    }

    /// Buckets must partition the map's keys by frequency and `min_freq`
    /// must name the lowest non-empty bucket
    fn verify(&self) -> Result<(), CacheError> {
        let mut bucketed = 0;
        for (&freq, bucket) in &self.freq_list {
            if bucket.is_empty() {
                return Err(CacheError::consistency(
                    PolicyType::Frequency,
                    format!("empty bucket left for frequency {freq}"),
                ));
            }
            for (&order, key) in bucket {
                bucketed += 1;
                match self.map.get(key) {
                    Some(entry) if entry.frequency == freq && entry.insertion_order == order => {}
                    Some(_) => {
                        return Err(CacheError::consistency(
                            PolicyType::Frequency,
                            format!("key filed under frequency {freq} disagrees with its entry"),
                        ));
                    }
                    None => {
                        return Err(CacheError::consistency(
                            PolicyType::Frequency,
                            "bucket holds a key missing from the store",
                        ));
                    }
                }
            }
        }
        if bucketed != self.map.len() {
            return Err(CacheError::consistency(
                PolicyType::Frequency,
                format!("buckets hold {bucketed} keys, store has {}", self.map.len()),
            ));
        }
        if let Some(&lowest) = self.freq_list.keys().next() {
            if lowest != self.min_freq {
                return Err(CacheError::consistency(
                    PolicyType::Frequency,
                    format!("min frequency is {} but lowest bucket is {lowest}", self.min_freq),
                ));
            }
        }
        if self.map.len() > self.capacity {
            return Err(CacheError::consistency(PolicyType::Frequency, "over capacity"));
        }
        Ok(())
    }
}
