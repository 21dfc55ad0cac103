//! Engine Entry Module
//!
//! A stored payload stamped with the time it was written.

use std::time::{Duration, Instant};

// == Engine Entry ==
/// A single engine slot. The engine itself knows nothing about per-key TTLs;
/// it only tracks age against the global life-window.
#[derive(Debug, Clone)]
pub struct EngineEntry {
    /// The stored bytes
    pub data: Vec<u8>,
    /// When the bytes were written
    pub written_at: Instant,
}

impl EngineEntry {
    /// Creates an entry written now.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            written_at: Instant::now(),
        }
    }

    // == Outlived ==
    /// Checks whether the entry has outlived `life_window` as of `now`.
    ///
    /// Boundary condition: an entry whose age equals the life-window is
    /// already outlived.
    pub fn is_outlived(&self, life_window: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) >= life_window
    }
}
