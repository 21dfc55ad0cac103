//! Expiration Overlay
//!
//! Per-key TTLs on top of an engine that only knows one global life-window.
//! Values written with [`Cache::set_ex`] carry their own expiry; reads check
//! it and reclaim expired entries on the spot.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use super::envelope::{Envelope, Opened};
use super::store::validate_key;
use super::Cache;
use crate::error::{CacheError, Result};

impl Cache {
    // == Set With Expiry ==
    /// Stores `value` under `key`, visible for `ttl` from now.
    ///
    /// The engine's life-window still applies on top; size it for the
    /// longest TTL callers will use.
    ///
    /// # Errors
    /// `KeyEmpty`, `ValueEmpty`, `InvalidTtl` for a TTL past the timestamp
    /// range, `NilCache`, or an engine failure.
    pub async fn set_ex(&self, key: &str, value: impl Into<Vec<u8>>, ttl: Duration) -> Result<()> {
        validate_key(key)?;
        let value = value.into();
        if value.is_empty() {
            return Err(CacheError::ValueEmpty);
        }

        let sealed = Envelope::new(value, ttl, Utc::now())?.seal()?;
        self.set(key, sealed).await
    }

    // == Get ==
    /// Returns the live value stored under `key`.
    ///
    /// Values written with [`set`](Cache::set) come back unchanged. Values
    /// written with [`set_ex`](Cache::set_ex) come back unwrapped while
    /// their TTL lasts; once it has passed the entry is deleted and the read
    /// reports `KeyNotFound`.
    ///
    /// # Errors
    /// `KeyEmpty`, `NilCache`, `KeyNotFound`, or an engine failure.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let raw = self.get_raw(key).await.inspect_err(|err| {
            if matches!(err, CacheError::KeyNotFound) {
                self.counters.record_miss();
            }
        })?;

        // Decoding runs after the shared lock is released.
        match Envelope::open(raw, Utc::now()) {
            Opened::Plain(value) | Opened::Live(value) => {
                self.counters.record_hit();
                Ok(value)
            }
            Opened::Expired => {
                self.counters.record_miss();
                self.evict_expired(key).await;
                Err(CacheError::KeyNotFound)
            }
        }
    }

    /// Deletes `key` if it still holds an expired envelope.
    ///
    /// Best-effort: the caller has already decided to report `KeyNotFound`,
    /// so failures are logged and dropped. The entry is re-read under the
    /// exclusive lock so a value written since the shared read survives.
    async fn evict_expired(&self, key: &str) {
        let mut guard = self.engine.write().await;
        let Some(engine) = guard.as_mut() else {
            return;
        };

        let still_expired = engine
            .get(key)
            .map(|raw| Envelope::open(raw, Utc::now()) == Opened::Expired)
            .unwrap_or(false);
        if !still_expired {
            return;
        }

        match engine.delete(key) {
            Ok(()) => {
                self.counters.record_expired();
                debug!(key, "Evicted expired entry on read");
            }
            Err(err) => debug!(key, %err, "Ignoring failed eviction of expired entry"),
        }
    }
}
