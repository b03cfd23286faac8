//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{Blob, CacheEntry, CacheStats, ContentHash, LruTracker, NodeId};

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    node: NodeId,
}

// == Content Store ==
/// Bounded content store with LRU eviction and a single TTL for every entry.
///
/// Not synchronized; see [`crate::cache::ContentCache`] for the shared handle.
#[derive(Debug)]
pub struct ContentStore {
    entries: HashMap<ContentHash, Slot>,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
    ttl: Duration,
}

impl ContentStore {
    // == Constructor ==
    /// Creates a new store with the given capacity and TTL.
    ///
    /// A capacity of zero is treated as one so a put always keeps the value
    /// it was handed.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Put ==
    /// Stores a blob under `key`.
    ///
    /// Overwriting refreshes the value, the expiry clock and the recency
    /// position without counting as a new entry. A brand-new key at capacity
    /// first purges expired entries, and evicts the least recently used live
    /// entry only when that frees nothing.
    pub fn put(&mut self, key: ContentHash, value: Blob) {
        self.put_at(key, value, Instant::now());
    }

    pub(crate) fn put_at(&mut self, key: ContentHash, value: Blob, now: Instant) {
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.entry = CacheEntry::new(value, now);
            self.lru.touch(slot.node);
            return;
        }

        if self.entries.len() >= self.max_entries {
            self.sweep_expired_at(now);
        }
        if self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        let node = self.lru.insert(key.clone());
        self.entries.insert(
            key,
            Slot {
                entry: CacheEntry::new(value, now),
                node,
            },
        );
    }

    // == Get ==
    /// Retrieves a blob by key.
    ///
    /// A live hit becomes the most recently used entry. An expired entry is
    /// purged on the spot and reported as absent.
    pub fn get(&mut self, key: &ContentHash) -> Option<Blob> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &ContentHash, now: Instant) -> Option<Blob> {
        let (expired, node) = match self.entries.get(key) {
            Some(slot) => (slot.entry.is_expired(self.ttl, now), slot.node),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(node);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.lru.touch(node);
        self.stats.record_hit();
        self.entries.get(key).map(|slot| slot.entry.value.clone())
    }

    // == Sweep Expired ==
    /// Removes all expired entries and returns how many were removed.
    ///
    /// Surviving entries keep their relative recency.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub(crate) fn sweep_expired_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired: Vec<(ContentHash, NodeId)> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired(ttl, now))
            .map(|(key, slot)| (key.clone(), slot.node))
            .collect();

        for (key, node) in &expired {
            self.entries.remove(key);
            self.lru.remove(*node);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }

    // == Size ==
    /// Number of live entries. Expired entries not yet purged are not counted.
    pub fn size(&self) -> usize {
        self.size_at(Instant::now())
    }

    pub(crate) fn size_at(&self, now: Instant) -> usize {
        self.entries
            .values()
            .filter(|slot| !slot.entry.is_expired(self.ttl, now))
            .count()
    }

    // == Length ==
    /// Stored entries including expired ones awaiting purge.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the counters with the live entry count filled in.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.live_entries = self.size();
        stats
    }

    /// Keys from least to most recently used, expired ones included.
    pub fn recency_order(&self) -> Vec<ContentHash> {
        self.lru.keys_oldest_first()
    }
}
