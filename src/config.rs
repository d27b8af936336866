//! Configuration Module
//!
//! Handles loading cache sizing and maintenance settings from environment variables.

use std::env;
use std::ops::RangeInclusive;

use tracing::warn;

/// Bytes per configured megabyte (binary convention).
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Accepted program cache sizes in megabytes.
pub const PROGRAM_CACHE_MB_RANGE: RangeInclusive<u64> = 64..=8192;

/// Accepted JSON cache sizes in megabytes.
pub const JSON_CACHE_MB_RANGE: RangeInclusive<u64> = 32..=4096;

/// Accepted eviction low-water marks, as a percentage of capacity.
pub const LOW_WATER_PERCENT_RANGE: RangeInclusive<u64> = 50..=100;

/// Engine configuration parameters.
///
/// Read once at process start and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Program cache budget in megabytes
    pub program_cache_mb: u64,
    /// JSON cache budget in megabytes
    pub json_cache_mb: u64,
    /// Eviction passes shrink a cache to this percentage of its capacity
    pub low_water_percent: u64,
    /// Background maintenance interval in seconds
    pub maintenance_interval: u64,
}

impl Config {
    /// Creates a Config with the given budgets, clamped to their accepted ranges.
    pub fn new(program_cache_mb: u64, json_cache_mb: u64) -> Self {
        Self {
            program_cache_mb: clamp_setting(
                "program_cache_mb",
                program_cache_mb,
                &PROGRAM_CACHE_MB_RANGE,
            ),
            json_cache_mb: clamp_setting("json_cache_mb", json_cache_mb, &JSON_CACHE_MB_RANGE),
            ..Self::default()
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CEL_PROGRAM_CACHE_SIZE_MB` - Program cache budget (default: 128, range 64..=8192)
    /// - `CEL_JSON_CACHE_SIZE_MB` - JSON cache budget (default: 64, range 32..=4096)
    /// - `CEL_EVICTION_LOW_WATER_PERCENT` - Eviction target (default: 90, range 50..=100)
    /// - `CEL_MAINTENANCE_INTERVAL` - Maintenance frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program_cache_mb: clamp_setting(
                "CEL_PROGRAM_CACHE_SIZE_MB",
                read_var("CEL_PROGRAM_CACHE_SIZE_MB").unwrap_or(defaults.program_cache_mb),
                &PROGRAM_CACHE_MB_RANGE,
            ),
            json_cache_mb: clamp_setting(
                "CEL_JSON_CACHE_SIZE_MB",
                read_var("CEL_JSON_CACHE_SIZE_MB").unwrap_or(defaults.json_cache_mb),
                &JSON_CACHE_MB_RANGE,
            ),
            low_water_percent: clamp_setting(
                "CEL_EVICTION_LOW_WATER_PERCENT",
                read_var("CEL_EVICTION_LOW_WATER_PERCENT").unwrap_or(defaults.low_water_percent),
                &LOW_WATER_PERCENT_RANGE,
            ),
            maintenance_interval: read_var("CEL_MAINTENANCE_INTERVAL")
                .unwrap_or(defaults.maintenance_interval)
                .max(1),
        }
    }

    /// Program cache capacity in bytes.
    pub fn program_cache_capacity_bytes(&self) -> u64 {
        self.program_cache_mb * BYTES_PER_MB
    }

    /// JSON cache capacity in bytes.
    pub fn json_cache_capacity_bytes(&self) -> u64 {
        self.json_cache_mb * BYTES_PER_MB
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program_cache_mb: 128,
            json_cache_mb: 64,
            low_water_percent: 90,
            maintenance_interval: 30,
        }
    }
}

fn read_var(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn clamp_setting(name: &str, value: u64, range: &RangeInclusive<u64>) -> u64 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!(
            "{} = {} is outside {}..={}, using {}",
            name,
            value,
            range.start(),
            range.end(),
            clamped
        );
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.program_cache_mb, 128);
        assert_eq!(config.json_cache_mb, 64);
        assert_eq!(config.low_water_percent, 90);
        assert_eq!(config.maintenance_interval, 30);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CEL_PROGRAM_CACHE_SIZE_MB");
        env::remove_var("CEL_JSON_CACHE_SIZE_MB");
        env::remove_var("CEL_EVICTION_LOW_WATER_PERCENT");
        env::remove_var("CEL_MAINTENANCE_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_new_clamps() {
        let config = Config::new(1, 100_000);
        assert_eq!(config.program_cache_mb, 64);
        assert_eq!(config.json_cache_mb, 4096);

        let config = Config::new(256, 128);
        assert_eq!(config.program_cache_mb, 256);
        assert_eq!(config.json_cache_mb, 128);
    }

    #[test]
    fn test_capacity_bytes_use_binary_megabytes() {
        let config = Config::default();
        assert_eq!(config.program_cache_capacity_bytes(), 128 * 1_048_576);
        assert_eq!(config.json_cache_capacity_bytes(), 64 * 1_048_576);
    }
}
