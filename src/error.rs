//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::string::FromUtf8Error;
use std::time::Duration;

use thiserror::Error;

// == Engine Error Enum ==
/// Failures reported by the storage engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No entry is stored under the key
    #[error("entry not found")]
    EntryNotFound,

    /// Payload exceeds the configured maximum entry size
    #[error("entry of {size} bytes exceeds maximum of {max} bytes")]
    EntryTooLarge { size: usize, max: usize },

    /// Engine configuration was rejected
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The background sweep needs a tokio runtime
    #[error("no tokio runtime available to run the engine sweep")]
    NoRuntime,
}

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Empty key supplied to a keyed operation
    #[error("key is empty")]
    KeyEmpty,

    /// No live entry for the key (absent or expired)
    #[error("key not found")]
    KeyNotFound,

    /// Empty payload supplied to a write
    #[error("value is empty")]
    ValueEmpty,

    /// Operation on a closed cache
    #[error("cache is closed")]
    NilCache,

    /// TTL too large to represent as a timestamp
    #[error("invalid ttl: {0:?}")]
    InvalidTtl(Duration),

    /// JSON marshal or unmarshal failure
    #[error("failed to {context} data: {source}")]
    Serialization {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Stored payload is not valid UTF-8 text
    #[error("value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// Any other engine failure, passed through unchanged
    #[error(transparent)]
    Engine(EngineError),
}

impl CacheError {
    pub(crate) fn marshal(source: serde_json::Error) -> Self {
        Self::Serialization {
            context: "marshal",
            source,
        }
    }

    pub(crate) fn unmarshal(source: serde_json::Error) -> Self {
        Self::Serialization {
            context: "unmarshal",
            source,
        }
    }
}

impl From<EngineError> for CacheError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::EntryNotFound => Self::KeyNotFound,
            other => Self::Engine(other),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
