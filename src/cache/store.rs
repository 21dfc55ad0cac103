//! Cache Store Module
//!
//! The [`Cache`] handle and its store adapter: the single choke point for
//! engine access, validation, and lifecycle.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{CacheOption, Config, Settings};
use crate::context::CancelContext;
use crate::engine::{CacheStats, Counters, Engine};
use crate::error::{CacheError, EngineError, Result};
use crate::tasks::{spawn_cleanup_task, SharedEngine};

// == Cache ==
/// Concurrency-safe byte cache with per-key TTLs.
///
/// Reads take the shared lock, writes take the exclusive lock. After
/// [`close`](Cache::close) every keyed operation fails with
/// [`CacheError::NilCache`].
#[derive(Debug)]
pub struct Cache {
    /// Engine slot guarded by the reader/writer lock
    pub(super) engine: SharedEngine,
    /// Counters shared with the engine
    pub(super) counters: Arc<Counters>,
    /// Lifecycle of the engine sweep
    context: CancelContext,
    /// Sweep task, if the clean-window is non-zero
    sweeper: Option<JoinHandle<()>>,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache whose life-window is `minutes` long, adjusted by
    /// `options` in order (later options win).
    ///
    /// Must be called within a tokio runtime unless the clean-window is set
    /// to zero.
    pub fn new(minutes: u64, options: impl IntoIterator<Item = CacheOption>) -> Result<Self> {
        Self::open(Settings::resolve(Config::with_minutes(minutes), options))
    }

    /// Creates a cache from an explicit config, optionally tied to `context`.
    pub fn from_config(config: Config, context: Option<CancelContext>) -> Result<Self> {
        Self::open(Settings { config, context })
    }

    fn open(settings: Settings) -> Result<Self> {
        let Settings { config, context } = settings;

        let engine = Engine::new(&config)?;
        let counters = Arc::clone(engine.counters());
        let engine: SharedEngine = Arc::new(RwLock::new(Some(engine)));

        // Own a child so `close` never cancels a caller's context.
        let context = context.unwrap_or_default().child();

        let sweeper = if config.clean_window.is_zero() {
            None
        } else {
            Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
            Some(spawn_cleanup_task(
                Arc::clone(&engine),
                config.clean_window,
                context.clone(),
            ))
        };

        info!(
            life_window = ?config.life_window,
            clean_window = ?config.clean_window,
            shards = config.shards,
            "Cache opened"
        );

        Ok(Self {
            engine,
            counters,
            context,
            sweeper,
        })
    }

    // == Raw Get ==
    /// Reads the stored bytes without envelope handling.
    pub(super) async fn get_raw(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;

        let guard = self.engine.read().await;
        let engine = guard.as_ref().ok_or(CacheError::NilCache)?;
        Ok(engine.get(key)?)
    }

    // == Set ==
    /// Stores `value` under `key` with no per-key TTL.
    ///
    /// # Errors
    /// `KeyEmpty`, `ValueEmpty`, `NilCache`, or an engine failure.
    pub async fn set(&self, key: &str, value: impl Into<Vec<u8>>) -> Result<()> {
        validate_key(key)?;
        let value = value.into();
        if value.is_empty() {
            return Err(CacheError::ValueEmpty);
        }

        let mut guard = self.engine.write().await;
        let engine = guard.as_mut().ok_or(CacheError::NilCache)?;
        Ok(engine.set(key, value)?)
    }

    // == Delete ==
    /// Removes the entry under `key`.
    ///
    /// # Errors
    /// `KeyEmpty`, `NilCache`, or `KeyNotFound` if nothing was stored.
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let mut guard = self.engine.write().await;
        let engine = guard.as_mut().ok_or(CacheError::NilCache)?;
        Ok(engine.delete(key)?)
    }

    // == Has ==
    /// Returns true if `key` holds a live value. Never fails; any error,
    /// including a closed cache, reads as false.
    ///
    /// Like [`get`](Cache::get), this reclaims an expired entry it finds and
    /// counts as a hit or miss in [`stats`](Cache::stats).
    pub async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_ok()
    }

    // == Close ==
    /// Stops the engine sweep and releases all entries. Idempotent.
    ///
    /// Operations still in flight on other tasks may observe either state.
    pub async fn close(&self) {
        self.context.cancel();

        if let Some(mut engine) = self.engine.write().await.take() {
            engine.close();
            info!("Cache closed");
        }
    }

    /// Returns true once [`close`](Cache::close) has run.
    pub async fn is_closed(&self) -> bool {
        self.engine.read().await.is_none()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> Result<CacheStats> {
        let guard = self.engine.read().await;
        let engine = guard.as_ref().ok_or(CacheError::NilCache)?;
        Ok(engine.stats())
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet
    /// reclaimed.
    pub async fn len(&self) -> Result<usize> {
        let guard = self.engine.read().await;
        let engine = guard.as_ref().ok_or(CacheError::NilCache)?;
        Ok(engine.len())
    }

    /// Returns true if no entries are stored.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.context.cancel();
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

pub(super) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        Err(CacheError::KeyEmpty)
    } else {
        Ok(())
    }
}
