//! LRU Ordering Module
//!
//! Implements least-recently-used ordering for cache eviction.
//!
//! Instead of a shared queue that every read has to lock and reorder, each
//! entry carries a stamp drawn from a monotonic clock. A read is one atomic
//! increment plus one atomic store. Eviction sorts a snapshot of the stamps
//! and takes the oldest first.

use std::sync::atomic::{AtomicU64, Ordering};

// == Recency Clock ==
/// Monotonic source of access stamps. Higher = more recent.
#[derive(Debug, Default)]
pub struct RecencyClock {
    next: AtomicU64,
}

impl RecencyClock {
    // == Constructor ==
    /// Creates a clock starting at zero.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    // == Tick ==
    /// Returns a fresh stamp, strictly greater than every previous one.
    pub fn tick(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// == Eviction Candidate ==
/// Snapshot of one entry taken at the start of an eviction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<K> {
    pub key: K,
    pub last_access: u64,
    pub size: u64,
}

// == Select Victims ==
/// Picks the keys to evict, least recently used first, until at least
/// `bytes_to_free` bytes are covered or the candidates run out.
///
/// Entries whose key equals `protect` are never selected.
pub fn select_victims<K: PartialEq>(
    mut candidates: Vec<Candidate<K>>,
    bytes_to_free: u64,
    protect: Option<&K>,
) -> Vec<Candidate<K>> {
    if bytes_to_free == 0 {
        return Vec::new();
    }

    candidates.sort_unstable_by_key(|c| c.last_access);

    let mut freed = 0u64;
    let mut victims = Vec::new();
    for candidate in candidates {
        if freed >= bytes_to_free {
            break;
        }
        if protect.is_some_and(|p| *p == candidate.key) {
            continue;
        }
        freed = freed.saturating_add(candidate.size);
        victims.push(candidate);
    }
    victims
}
