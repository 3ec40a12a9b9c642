//! # Config
//!
//! Runtime settings for the reference-data codec workspace.
//!
//! Everything is read from environment variables with sensible defaults, so
//! the shell and tests can be reconfigured without a config file:
//!
//! ```text
//! REFDATA_BUFFER_CAPACITY      default pooled buffer capacity  (default: 4096)
//! REFDATA_POOL_MAX_PER_BUCKET  buffers kept per capacity class (default: 16)
//! REFDATA_LOG                  tracing filter for the shell    (default: "warn")
//! ```
//!
//! Values that fail to parse fall back to the default rather than aborting.

/// Default capacity in bytes of a pooled value buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Default number of idle buffers retained per capacity class.
pub const DEFAULT_POOL_MAX_PER_BUCKET: usize = 16;

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings shared by the buffer pool and the `refdata` shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDataConfig {
    /// Capacity handed to callers that do not know their record size up front.
    pub buffer_capacity: usize,
    /// Idle buffers the pool keeps per power-of-two capacity class.
    pub pool_max_per_bucket: usize,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
}

impl RefDataConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Used by tests so they do not have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let buffer_capacity = env_or("REFDATA_BUFFER_CAPACITY", "4096")
            .parse()
            .ok()
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_BUFFER_CAPACITY);
        let pool_max_per_bucket = env_or("REFDATA_POOL_MAX_PER_BUCKET", "16")
            .parse()
            .unwrap_or(DEFAULT_POOL_MAX_PER_BUCKET);
        let log_filter = env_or("REFDATA_LOG", DEFAULT_LOG_FILTER);

        Self {
            buffer_capacity,
            pool_max_per_bucket,
            log_filter,
        }
    }
}

impl Default for RefDataConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            pool_max_per_bucket: DEFAULT_POOL_MAX_PER_BUCKET,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = RefDataConfig::from_lookup(|_| None);
        assert_eq!(cfg, RefDataConfig::default());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = RefDataConfig::from_lookup(lookup_from(&[
            ("REFDATA_BUFFER_CAPACITY", "128"),
            ("REFDATA_POOL_MAX_PER_BUCKET", "2"),
            ("REFDATA_LOG", "codec=trace"),
        ]));
        assert_eq!(cfg.buffer_capacity, 128);
        assert_eq!(cfg.pool_max_per_bucket, 2);
        assert_eq!(cfg.log_filter, "codec=trace");
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let cfg = RefDataConfig::from_lookup(lookup_from(&[
            ("REFDATA_BUFFER_CAPACITY", "lots"),
            ("REFDATA_POOL_MAX_PER_BUCKET", "-1"),
        ]));
        assert_eq!(cfg.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(cfg.pool_max_per_bucket, DEFAULT_POOL_MAX_PER_BUCKET);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = RefDataConfig::from_lookup(lookup_from(&[("REFDATA_BUFFER_CAPACITY", "0")]));
        assert_eq!(cfg.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }
}
