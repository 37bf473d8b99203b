use std::collections::HashMap;
use std::hash::Hash;

use super::{CacheEntry, PolicyType};
use crate::{CacheError, EvictionBackend};

/// Recency-ordered backend (LRU)
///
/// Entries live in a slab-backed doubly-linked list: the head is the least
/// recently touched entry and the eviction candidate, the tail is the most
/// recent. A HashMap from key to slot gives O(1) lookup, move-to-tail and
/// eviction.
pub struct RecencyBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Key to slot index
    map: HashMap<K, usize>,
    /// Node storage; `None` marks a free slot
    slots: Vec<Option<Node<K, V>>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    /// Least recently used end
    head: Option<usize>,
    /// Most recently used end
    tail: Option<usize>,
    capacity: usize,
    next_order: u64,
}

/// Internal node structure for the doubly-linked list
struct Node<K, V> {
    entry: CacheEntry<K, V>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> RecencyBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates an empty recency backend holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
            next_order: 0,
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<K, V>> {
        self.slots.get(idx).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(idx).and_then(|slot| slot.as_mut())
    }

    /// Unlinks a node from its current position, leaving it in its slot
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }

    /// Links an unlinked node at the tail (most recently used)
    fn push_tail(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(idx) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail.and_then(|t| self.node_mut(t)) {
            Some(tail_node) => tail_node.next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn move_to_tail(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_tail(idx);
    }

    /// Stores a fresh node at the tail, reusing a free slot when possible
    fn attach(&mut self, entry: CacheEntry<K, V>) {
        let key = entry.key.clone();
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.map.insert(key, idx);
        self.push_tail(idx);
    }

    /// Iterates entries from least to most recently used
    fn iter(&self) -> impl Iterator<Item = &CacheEntry<K, V>> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(&node.entry)
        })
    }
}

impl<K, V> EvictionBackend<K, V> for RecencyBackend<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn policy(&self) -> PolicyType {
        PolicyType::Recency
    }

    /// Looks up a key, moving it to the most-recent end and bumping its count
    fn get(&mut self, key: &K) -> Option<&CacheEntry<K, V>> {
        let idx = *self.map.get(key)?;
        self.move_to_tail(idx);
        let node = self.node_mut(idx)?;
        node.entry.frequency += 1;
        Some(&node.entry)
    }

    fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        let idx = *self.map.get(key)?;
        self.node(idx).map(|node| &node.entry)
    }

    /// Inserts at the most-recent end, evicting the head first when full
    ///
    /// A resident key has its value replaced and is moved to the tail.
    fn put(&mut self, key: K, value: V) -> Result<Option<K>, CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::Capacity);
        }

        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = self.node_mut(idx) {
                node.entry.value = value;
                node.entry.frequency += 1;
            }
            self.move_to_tail(idx);
            return Ok(None);
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict_one()?
        } else {
            None
        };

        let order = self.next_order;
        self.next_order += 1;
        self.attach(CacheEntry::new(key, value, order));
        Ok(evicted)
    }

    /// Removes the least recently used entry (the head)
    fn evict_one(&mut self) -> Result<Option<K>, CacheError> {
        let Some(idx) = self.head else {
            return Ok(None);
        };
        let resident = self
            .node(idx)
            .ok_or_else(|| {
                CacheError::consistency(PolicyType::Recency, format!("head slot {idx} is empty"))
            })
            .map(|node| self.map.contains_key(&node.entry.key))?;
        if !resident {
            return Err(CacheError::consistency(
                PolicyType::Recency,
                "evicted head has no map entry",
            ));
        }

        self.unlink(idx);
        let Some(node) = self.slots.get_mut(idx).and_then(|slot| slot.take()) else {
            return Err(CacheError::consistency(
                PolicyType::Recency,
                format!("head slot {idx} is empty"),
            ));
        };
        self.free.push(idx);
        self.map.remove(&node.entry.key);
        Ok(Some(node.entry.key))
    }

    /// Entries from least to most recently used
    fn export_entries(&self) -> Vec<CacheEntry<K, V>> {
        self.iter().cloned().collect()
    }

    fn import_entry(&mut self, entry: CacheEntry<K, V>) -> Result<(), CacheError> {
        if self.map.contains_key(&entry.key) {
            return Err(CacheError::consistency(
                PolicyType::Recency,
                "imported key is already resident",
            ));
        }
        if self.map.len() >= self.capacity {
            return Err(CacheError::Capacity);
        }
        self.next_order = self.next_order.max(entry.insertion_order + 1);
        self.attach(entry);
        Ok(())
    }

    fn position(&self, key: &K) -> Option<usize> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.iter().position(|entry| &entry.key == key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// The list must hold exactly the map's keys, each once
    fn verify(&self) -> Result<(), CacheError> {
        let mut walked = 0;
        for entry in self.iter() {
            walked += 1;
            if walked > self.map.len() {
                return Err(CacheError::consistency(
                    PolicyType::Recency,
                    "order list is longer than the map",
                ));
            }
            if !self.map.contains_key(&entry.key) {
                return Err(CacheError::consistency(
                    PolicyType::Recency,
                    "order list holds a key missing from the map",
                ));
            }
        }
        if walked != self.map.len() {
            return Err(CacheError::consistency(
                PolicyType::Recency,
                format!("order list has {walked} keys, map has {}", self.map.len()),
            ));
        }
        if self.map.len() > self.capacity {
            return Err(CacheError::consistency(PolicyType::Recency, "over capacity"));
        }
        Ok(())
    }
}
