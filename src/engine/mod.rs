//! Engine Module
//!
//! A sharded, time-windowed key to bytes store. Every entry shares a single
//! global life-window; the periodic sweep (see [`crate::tasks`]) reclaims
//! entries that outlived it. Between outliving the window and the next sweep
//! an entry is still readable.
//!
//! The engine does no locking of its own. The cache serializes all access
//! through one reader/writer lock.

mod entry;
mod stats;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Config;
use crate::error::EngineError;

pub use entry::EngineEntry;
pub use stats::{CacheStats, Counters};

// == Engine ==
/// Sharded byte store with a global life-window.
#[derive(Debug)]
pub struct Engine {
    /// Key-value storage, partitioned by key hash
    shards: Vec<HashMap<String, EngineEntry>>,
    /// Age after which the sweep reclaims an entry
    life_window: Duration,
    /// Largest accepted payload
    max_entry_size: usize,
    /// Performance counters, shared with the cache read path
    counters: Arc<Counters>,
}

impl Engine {
    // == Constructor ==
    /// Creates an engine from `config`, rejecting unusable parameters.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        if config.life_window.is_zero() {
            return Err(EngineError::InvalidConfig(
                "life window must be greater than zero".to_string(),
            ));
        }
        if !config.shards.is_power_of_two() {
            return Err(EngineError::InvalidConfig(format!(
                "shard count must be a power of two, got {}",
                config.shards
            )));
        }
        if config.max_entry_size == 0 {
            return Err(EngineError::InvalidConfig(
                "max entry size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            shards: (0..config.shards).map(|_| HashMap::new()).collect(),
            life_window: config.life_window,
            max_entry_size: config.max_entry_size,
            counters: Arc::default(),
        })
    }

    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        // Shard count is a power of two.
        (hasher.finish() as usize) & (self.shards.len() - 1)
    }

    // == Get ==
    /// Returns a copy of the bytes stored under `key`.
    pub fn get(&self, key: &str) -> Result<Vec<u8>, EngineError> {
        self.shards[self.shard_index(key)]
            .get(key)
            .map(|entry| entry.data.clone())
            .ok_or(EngineError::EntryNotFound)
    }

    // == Set ==
    /// Stores `data` under `key`, overwriting and restamping any previous entry.
    pub fn set(&mut self, key: &str, data: Vec<u8>) -> Result<(), EngineError> {
        if data.len() > self.max_entry_size {
            return Err(EngineError::EntryTooLarge {
                size: data.len(),
                max: self.max_entry_size,
            });
        }

        let index = self.shard_index(key);
        self.shards[index].insert(key.to_string(), EngineEntry::new(data));
        Ok(())
    }

    // == Delete ==
    /// Removes the entry under `key`.
    pub fn delete(&mut self, key: &str) -> Result<(), EngineError> {
        let index = self.shard_index(key);
        self.shards[index]
            .remove(key)
            .map(|_| ())
            .ok_or(EngineError::EntryNotFound)
    }

    // == Cleanup ==
    /// Removes every entry that outlived the life-window as of `now`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self, now: Instant) -> usize {
        let life_window = self.life_window;
        let mut removed = 0;

        for shard in &mut self.shards {
            let before = shard.len();
            shard.retain(|_, entry| !entry.is_outlived(life_window, now));
            removed += before - shard.len();
        }

        self.counters.record_reclaimed(removed);
        removed
    }

    // == Close ==
    /// Releases all stored entries.
    pub fn close(&mut self) {
        let released = self.len();
        self.shards.iter_mut().for_each(HashMap::clear);
        debug!(released, "Engine storage released");
    }

    /// Returns the number of stored entries, including outlived ones not yet swept.
    pub fn len(&self) -> usize {
        self.shards.iter().map(HashMap::len).sum()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(HashMap::is_empty)
    }

    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }
}
