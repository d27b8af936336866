//! Bounded Cache Module
//!
//! Memory-bounded cache combining a sharded concurrent map with stamp-based
//! LRU ordering and approximate size accounting.
//!
//! # Concurrency
//! - `get` takes only a shard read lock plus two atomic operations, so
//!   concurrent hits do not serialize on one mutex.
//! - `put`, `trim` and `clear` serialize on a per-cache write lock. They are
//!   only reached on misses and maintenance, never on the hot path.
//! - `stats` reads atomics and shard lengths; it never takes the write lock.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::lru::{select_victims, Candidate};
use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats, RecencyClock, DEFAULT_LOW_WATER_PERCENT};
use crate::error::{CacheError, Result};

// == Bounded Cache ==
/// Concurrent key/value cache bounded by an approximate byte budget.
pub struct BoundedCache<K, V> {
    /// Label used in log lines
    name: &'static str,
    /// Key-value storage
    entries: DashMap<K, CacheEntry<V>>,
    /// Source of recency stamps
    clock: RecencyClock,
    /// Hit/miss/eviction counters
    counters: StatsCounters,
    /// Sum of `approx_size` over live entries
    used_bytes: AtomicU64,
    /// Budget in bytes
    capacity_bytes: u64,
    /// Eviction passes shrink usage to this many bytes
    low_water_bytes: u64,
    /// Serializes every mutation of `entries` and `used_bytes`
    write_lock: Mutex<()>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone + AsRef<str>,
{
    // == Constructor ==
    /// Creates a cache with the default low-water mark.
    ///
    /// # Arguments
    /// * `name` - Label used in log lines
    /// * `capacity_bytes` - Approximate byte budget
    pub fn new(name: &'static str, capacity_bytes: u64) -> Self {
        Self::with_low_water(name, capacity_bytes, DEFAULT_LOW_WATER_PERCENT)
    }

    /// Creates a cache whose eviction passes shrink usage to
    /// `low_water_percent` of capacity. 100 evicts only what is needed to fit.
    pub fn with_low_water(name: &'static str, capacity_bytes: u64, low_water_percent: u64) -> Self {
        let percent = low_water_percent.clamp(1, 100);
        let low_water_bytes = (u128::from(capacity_bytes) * u128::from(percent) / 100) as u64;

        Self {
            name,
            entries: DashMap::new(),
            clock: RecencyClock::new(),
            counters: StatsCounters::new(),
            used_bytes: AtomicU64::new(0),
            capacity_bytes,
            low_water_bytes,
            write_lock: Mutex::new(()),
        }
    }

    // == Get ==
    /// Looks up a value, refreshing its recency on a hit.
    ///
    /// Records a hit or a miss. Never removes anything.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(entry) => {
                entry.touch(self.clock.tick());
                self.counters.record_hit();
                Some(entry.shared())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or replaces an entry, then runs an eviction pass if the cache
    /// went over budget.
    ///
    /// The entry just inserted is never evicted by its own pass. A value
    /// larger than the whole budget is still accepted; the next pass that
    /// does not protect it will remove it.
    ///
    /// # Arguments
    /// * `key` - Exact text the value was derived from
    /// * `value` - The value to cache
    /// * `value_size` - Approximate footprint of `value` in bytes
    ///
    /// Returns a shared handle to the stored value.
    pub fn put(&self, key: K, value: V, value_size: u64) -> Result<Arc<V>> {
        if key.as_ref().is_empty() {
            return Err(CacheError::InvalidKey("key must not be empty".to_string()));
        }

        let _guard = self.write_lock.lock();

        let entry = CacheEntry::new(value, value_size, self.clock.tick());
        let stored = entry.shared();
        let added = entry.approx_size();
        if added > self.capacity_bytes {
            warn!(
                "{} cache: entry of {} bytes exceeds capacity of {} bytes",
                self.name, added, self.capacity_bytes
            );
        }

        // Replace is remove-then-insert: the old size leaves before the new one lands
        let removed = self
            .entries
            .insert(key.clone(), entry)
            .map_or(0, |old| old.approx_size());
        let used = self
            .used_bytes
            .load(Ordering::Relaxed)
            .saturating_sub(removed)
            .saturating_add(added);
        self.used_bytes.store(used, Ordering::Relaxed);

        self.evict_locked(Some(&key));
        Ok(stored)
    }

    // == Trim ==
    /// Runs an eviction pass with no protected entry.
    ///
    /// Returns the number of entries evicted.
    pub fn trim(&self) -> usize {
        let _guard = self.write_lock.lock();
        self.evict_locked(None)
    }

    // == Clear ==
    /// Removes every entry and resets size accounting and all counters.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let _guard = self.write_lock.lock();

        let removed = self.entries.len();
        self.entries.clear();
        self.used_bytes.store(0, Ordering::Relaxed);
        self.counters.reset();

        debug!("{} cache: cleared {} entries", self.name, removed);
        removed
    }

    // == Stats ==
    /// Returns a snapshot of size and counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            approx_bytes_used: self.used_bytes.load(Ordering::Relaxed),
            capacity_bytes: self.capacity_bytes,
            hits: self.counters.hits(),
            misses: self.counters.misses(),
            evictions: self.counters.evictions(),
        }
    }

    /// Checks presence without touching recency or counters.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    // == Eviction ==
    /// Evicts least recently used entries until usage drops to the
    /// low-water mark. Caller must hold `write_lock`.
    fn evict_locked(&self, protect: Option<&K>) -> usize {
        let used = self.used_bytes.load(Ordering::Relaxed);
        if used <= self.capacity_bytes {
            return 0;
        }

        let candidates: Vec<Candidate<K>> = self
            .entries
            .iter()
            .map(|item| Candidate {
                key: item.key().clone(),
                last_access: item.value().last_access(),
                size: item.value().approx_size(),
            })
            .collect();

        let victims = select_victims(candidates, used - self.low_water_bytes, protect);

        let mut freed = 0u64;
        let mut evicted = 0usize;
        for victim in victims {
            if let Some((_, entry)) = self.entries.remove(&victim.key) {
                freed = freed.saturating_add(entry.approx_size());
                evicted += 1;
            }
        }

        let remaining = used.saturating_sub(freed);
        self.used_bytes.store(remaining, Ordering::Relaxed);
        self.counters.record_evictions(evicted as u64);

        debug!(
            "{} cache: evicted {} entries, freed {} bytes, {} of {} bytes in use",
            self.name, evicted, freed, remaining, self.capacity_bytes
        );
        if remaining > self.capacity_bytes {
            debug!(
                "{} cache: still over budget after eviction, deferring to next pass",
                self.name
            );
        }

        evicted
    }
}

impl<K: Eq + Hash, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("used_bytes", &self.used_bytes.load(Ordering::Relaxed))
            .field("capacity_bytes", &self.capacity_bytes)
            .field("low_water_bytes", &self.low_water_bytes)
            .finish_non_exhaustive()
    }
}
