//! Cache Module
//!
//! The [`Cache`] handle: a lock-guarded store adapter, the per-key expiration
//! overlay, and typed helpers on top.

mod envelope;
mod expiring;
mod store;
mod typed;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use store::Cache;
pub use typed::{Value, ValueKind};
