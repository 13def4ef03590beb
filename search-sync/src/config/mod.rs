//! Configuration and dependency initialization for the search sync engine.

pub mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Upper bound on concurrent upserts within one page.
pub const MAX_INDEX_CONCURRENCY: usize = 16;

/// Default number of posts fetched per page.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default minimum acceptable sync ratio.
pub const DEFAULT_SYNC_THRESHOLD: f64 = 0.5;

/// Default number of upsert attempts per record.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default lifetime of a failure queue entry (24 hours).
pub const DEFAULT_FAILURE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const DEFAULT_CONCURRENCY: usize = 4;

/// Tunables of the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Master switch; when false the startup pass does nothing.
    pub enabled: bool,
    /// Rebuild automatically when divergence is detected.
    pub auto_init_enabled: bool,
    /// Minimum acceptable `index_count / authoritative_count`.
    pub sync_threshold: f64,
    pub batch_size: usize,
    /// Upsert attempts per record, including the first.
    pub max_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Concurrent upserts per page, at most [`MAX_INDEX_CONCURRENCY`].
    pub concurrency: usize,
    pub failure_entry_ttl: Duration,
    /// Period of the background retry pass; zero disables it.
    pub retry_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_init_enabled: true,
            sync_threshold: DEFAULT_SYNC_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::ZERO,
            concurrency: DEFAULT_CONCURRENCY,
            failure_entry_ttl: DEFAULT_FAILURE_TTL,
            retry_interval: Duration::ZERO,
        }
    }
}

impl SyncConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SYNC_ENABLED`: Run the startup consistency pass (default: true)
    /// - `SYNC_AUTO_INIT_ENABLED`: Rebuild automatically on divergence (default: true)
    /// - `SYNC_THRESHOLD`: Minimum sync ratio, 0..=1 (default: 0.5)
    /// - `SYNC_BATCH_SIZE`: Posts per page (default: 100)
    /// - `SYNC_MAX_ATTEMPTS`: Upsert attempts per post (default: 3)
    /// - `SYNC_RETRY_BACKOFF_MS`: Base delay between attempts (default: 0)
    /// - `SYNC_CONCURRENCY`: Concurrent upserts per page, 1..=16 (default: 4)
    /// - `SYNC_FAILURE_TTL_SECS`: Failure entry lifetime (default: 86400)
    /// - `SYNC_RETRY_INTERVAL_SECS`: Background retry period, 0 = off (default: 0)
    ///
    /// Invalid values are logged and replaced with the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let sync_threshold = parse_or(&lookup, "SYNC_THRESHOLD", defaults.sync_threshold);
        let sync_threshold = if (0.0..=1.0).contains(&sync_threshold) {
            sync_threshold
        } else {
            warn!(
                value = sync_threshold,
                "SYNC_THRESHOLD must be between 0 and 1, using default"
            );
            defaults.sync_threshold
        };

        let batch_size = parse_or(&lookup, "SYNC_BATCH_SIZE", defaults.batch_size);
        let batch_size = if batch_size == 0 {
            warn!("SYNC_BATCH_SIZE must be greater than zero, using default");
            defaults.batch_size
        } else {
            batch_size
        };

        let max_attempts = parse_or(&lookup, "SYNC_MAX_ATTEMPTS", defaults.max_attempts);
        let max_attempts = if max_attempts == 0 {
            warn!("SYNC_MAX_ATTEMPTS must be greater than zero, using default");
            defaults.max_attempts
        } else {
            max_attempts
        };

        let concurrency = parse_or(&lookup, "SYNC_CONCURRENCY", defaults.concurrency);
        let concurrency = if concurrency == 0 || concurrency > MAX_INDEX_CONCURRENCY {
            warn!(
                value = concurrency,
                max = MAX_INDEX_CONCURRENCY,
                "SYNC_CONCURRENCY out of range, clamping"
            );
            concurrency.clamp(1, MAX_INDEX_CONCURRENCY)
        } else {
            concurrency
        };

        Self {
            enabled: parse_or(&lookup, "SYNC_ENABLED", defaults.enabled),
            auto_init_enabled: parse_or(&lookup, "SYNC_AUTO_INIT_ENABLED", defaults.auto_init_enabled),
            sync_threshold,
            batch_size,
            max_attempts,
            retry_backoff: Duration::from_millis(parse_or(&lookup, "SYNC_RETRY_BACKOFF_MS", 0)),
            concurrency,
            failure_entry_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SYNC_FAILURE_TTL_SECS",
                defaults.failure_entry_ttl.as_secs(),
            )),
            retry_interval: Duration::from_secs(parse_or(&lookup, "SYNC_RETRY_INTERVAL_SECS", 0)),
        }
    }
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!(variable = name, value = %raw, error = %e, default = %default, "Invalid value, using default");
                default
            }
        },
    }
}
