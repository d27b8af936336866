//! Cache ownership and one-time initialization.
//!
//! `CacheContext` owns the program cache and the JSON cache. It is created
//! once per process by `CacheInitializer` and handed to every
//! `EvaluationEngine` explicitly rather than reached through a global.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::runtime::ExpressionRuntime;
use crate::cache::{BoundedCache, CacheStats};
use crate::config::Config;

/// Snapshot of both caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedStats {
    pub program_cache: CacheStats,
    pub json_cache: CacheStats,
}

// == Cache Context ==
/// The two process-wide caches.
pub struct CacheContext<R: ExpressionRuntime> {
    /// Expression text -> compiled program
    programs: BoundedCache<String, R::Program>,
    /// Raw JSON text -> prepared data
    json: BoundedCache<String, R::Data>,
}

impl<R: ExpressionRuntime> CacheContext<R> {
    /// Sizes both caches from configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_capacities(
            config.program_cache_capacity_bytes(),
            config.json_cache_capacity_bytes(),
            config.low_water_percent,
        )
    }

    /// Builds caches with explicit byte budgets.
    pub fn with_capacities(program_bytes: u64, json_bytes: u64, low_water_percent: u64) -> Self {
        Self {
            programs: BoundedCache::with_low_water("program", program_bytes, low_water_percent),
            json: BoundedCache::with_low_water("json", json_bytes, low_water_percent),
        }
    }

    pub fn programs(&self) -> &BoundedCache<String, R::Program> {
        &self.programs
    }

    pub fn json(&self) -> &BoundedCache<String, R::Data> {
        &self.json
    }

    /// Returns a snapshot of both caches.
    pub fn stats(&self) -> CombinedStats {
        CombinedStats {
            program_cache: self.programs.stats(),
            json_cache: self.json.stats(),
        }
    }

    /// Clears both caches. Returns the number of entries removed from each.
    pub fn clear(&self) -> (usize, usize) {
        (self.programs.clear(), self.json.clear())
    }

    /// Runs an unprotected eviction pass on both caches.
    pub fn trim(&self) -> (usize, usize) {
        (self.programs.trim(), self.json.trim())
    }
}

impl<R: ExpressionRuntime> fmt::Debug for CacheContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheContext")
            .field("programs", &self.programs)
            .field("json", &self.json)
            .finish()
    }
}

// == Cache Initializer ==
/// Creates the `CacheContext` exactly once.
///
/// The first `initialize` call builds the caches from its configuration.
/// Later calls are no-ops that log a warning and return the existing caches;
/// the configuration is fixed for the life of the process.
pub struct CacheInitializer<R: ExpressionRuntime> {
    slot: OnceLock<Arc<CacheContext<R>>>,
}

impl<R: ExpressionRuntime> CacheInitializer<R> {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Builds the caches on first call; returns the existing ones afterwards.
    pub fn initialize(&self, config: &Config) -> Arc<CacheContext<R>> {
        let mut created = false;
        let caches = self.slot.get_or_init(|| {
            created = true;
            info!(
                "Initializing caches: program={}MB, json={}MB, low_water={}%",
                config.program_cache_mb, config.json_cache_mb, config.low_water_percent
            );
            Arc::new(CacheContext::new(config))
        });

        if !created {
            warn!("Caches already initialized, ignoring new configuration");
        }
        Arc::clone(caches)
    }

    /// Returns the caches if `initialize` has run.
    pub fn get(&self) -> Option<Arc<CacheContext<R>>> {
        self.slot.get().map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<R: ExpressionRuntime> Default for CacheInitializer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ExpressionRuntime> fmt::Debug for CacheInitializer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheInitializer")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
