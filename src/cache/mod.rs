//! Cache Module
//!
//! Provides memory-bounded, concurrency-safe caching with LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{entry_cost, CacheEntry};
pub use lru::{select_victims, Candidate, RecencyClock};
pub use stats::{CacheStats, StatsCounters};
pub use store::BoundedCache;

// == Public Constants ==
/// Fixed bytes charged per entry on top of the value's own estimate
pub const ENTRY_OVERHEAD_BYTES: u64 = 64;

/// Eviction passes shrink a cache to this percentage of its capacity
pub const DEFAULT_LOW_WATER_PERCENT: u64 = 90;
