//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is open.
//!
//! # Tasks
//! - Engine sweep: reclaims entries that outlived the life-window

mod cleanup;

pub(crate) use cleanup::{spawn_cleanup_task, SharedEngine};
