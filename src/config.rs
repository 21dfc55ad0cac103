//! Configuration Module
//!
//! Engine start-up parameters and the construction-time options that adjust them.

use std::env;
use std::time::Duration;

use crate::context::CancelContext;

/// Default interval between engine sweeps
pub const DEFAULT_CLEAN_WINDOW: Duration = Duration::from_secs(1);

/// Default number of engine shards
pub const DEFAULT_SHARDS: usize = 64;

/// Default maximum size of a single stored entry in bytes
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 1024 * 1024; // 1 MB

/// Engine configuration parameters.
///
/// Resolved once when a cache is constructed and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Age after which the sweep reclaims an entry
    pub life_window: Duration,
    /// Interval between sweeps; zero disables the sweep
    pub clean_window: Duration,
    /// Number of shards keys are hashed over (power of two)
    pub shards: usize,
    /// Largest payload accepted by a single write
    pub max_entry_size: usize,
}

impl Config {
    /// Creates a config with the given life-window and defaults for the rest.
    pub fn new(life_window: Duration) -> Self {
        Self {
            life_window,
            clean_window: DEFAULT_CLEAN_WINDOW,
            shards: DEFAULT_SHARDS,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }

    /// Creates a config whose life-window is given in whole minutes.
    pub fn with_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_LIFE_WINDOW_SECS` - Life-window in seconds (default: 600)
    /// - `CACHE_CLEAN_WINDOW_SECS` - Sweep interval in seconds (default: 1)
    /// - `CACHE_SHARDS` - Shard count (default: 64)
    /// - `CACHE_MAX_ENTRY_SIZE` - Maximum entry size in bytes (default: 1 MB)
    pub fn from_env() -> Self {
        Self {
            life_window: Duration::from_secs(
                env::var("CACHE_LIFE_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(600),
            ),
            clean_window: Duration::from_secs(
                env::var("CACHE_CLEAN_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1),
            ),
            shards: env::var("CACHE_SHARDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SHARDS),
            max_entry_size: env::var("CACHE_MAX_ENTRY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ENTRY_SIZE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_minutes(10)
    }
}

// == Options ==
/// A construction-time adjustment, applied in the order supplied.
#[derive(Debug, Clone)]
pub enum CacheOption {
    /// Ties the engine lifecycle to a caller-controlled context
    Context(CancelContext),
    /// Overrides the life-window
    LifeWindow(Duration),
    /// Overrides the sweep interval
    CleanWindow(Duration),
}

/// Ties the cache lifecycle to `context`; cancelling it stops the sweep.
pub fn with_context(context: CancelContext) -> CacheOption {
    CacheOption::Context(context)
}

/// Overrides the global life-window.
pub fn with_life_window(life: Duration) -> CacheOption {
    CacheOption::LifeWindow(life)
}

/// Overrides the interval between engine sweeps.
pub fn with_clean_window(clean: Duration) -> CacheOption {
    CacheOption::CleanWindow(clean)
}

/// Config plus the lifecycle context, as assembled from options.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub config: Config,
    pub context: Option<CancelContext>,
}

impl Settings {
    pub fn resolve(config: Config, options: impl IntoIterator<Item = CacheOption>) -> Self {
        let mut settings = Self {
            config,
            context: None,
        };
        for option in options {
            settings.apply(option);
        }
        settings
    }

    fn apply(&mut self, option: CacheOption) {
        match option {
            CacheOption::Context(context) => self.context = Some(context),
            CacheOption::LifeWindow(life) => self.config.life_window = life,
            CacheOption::CleanWindow(clean) => self.config.clean_window = clean,
        }
    }
}
