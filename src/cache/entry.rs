//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with size and recency metadata.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::ENTRY_OVERHEAD_BYTES;

// == Cache Entry ==
/// A single cached value with its approximate cost and last access stamp.
///
/// The value is immutable once inserted; only `last_access` moves.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value, shared with every caller that hits it
    value: Arc<V>,
    /// Approximate bytes charged against the cache budget
    approx_size: u64,
    /// Recency stamp from the owning cache's `RecencyClock`
    last_access: AtomicU64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `value_size` - Caller's estimate of the value's footprint in bytes
    /// * `stamp` - Initial recency stamp
    pub fn new(value: V, value_size: u64, stamp: u64) -> Self {
        Self {
            value: Arc::new(value),
            approx_size: entry_cost(value_size),
            last_access: AtomicU64::new(stamp),
        }
    }

    /// Returns a shared handle to the value.
    pub fn shared(&self) -> Arc<V> {
        Arc::clone(&self.value)
    }

    /// Bytes this entry is charged for, overhead included.
    pub fn approx_size(&self) -> u64 {
        self.approx_size
    }

    // == Touch ==
    /// Records an access. Stamps only move forward.
    pub fn touch(&self, stamp: u64) {
        self.last_access.fetch_max(stamp, Ordering::Relaxed);
    }

    /// Returns the most recent access stamp.
    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}

// == Utility Functions ==
/// Bytes charged for a value of `value_size` bytes.
pub fn entry_cost(value_size: u64) -> u64 {
    value_size.saturating_add(ENTRY_OVERHEAD_BYTES)
}
