//! Rose Cache - a typed in-memory byte cache with per-key TTLs
//!
//! Wraps a sharded engine that only knows one global life-window and adds
//! per-key expiration plus text and JSON helpers.
//!
//! ```ignore
//! use rose_cache::Cache;
//! use std::time::Duration;
//!
//! let cache = Cache::new(10, [])?;
//! cache.set_ex_string("session", "abc", Duration::from_secs(30)).await?;
//! assert_eq!(cache.get_string("session").await?, "abc");
//! cache.close().await;
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
mod tasks;

pub use cache::{Cache, Value, ValueKind};
pub use config::{with_clean_window, with_context, with_life_window, CacheOption, Config};
pub use context::CancelContext;
pub use engine::CacheStats;
pub use error::{CacheError, EngineError, Result};
