//! Engine Sweep Task
//!
//! Background task that periodically reclaims entries that outlived the
//! engine's life-window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::context::CancelContext;
use crate::engine::Engine;

/// Shared engine slot; `None` once the cache is closed.
pub(crate) type SharedEngine = Arc<RwLock<Option<Engine>>>;

/// Spawns a background task that sweeps the engine every `clean_window`.
///
/// Each run takes the exclusive lock. The task exits when `context` is
/// cancelled or when it finds the engine gone.
///
/// # Returns
/// A JoinHandle for the spawned task.
///
/// # Panics
/// Panics if called outside a tokio runtime.
pub(crate) fn spawn_cleanup_task(
    engine: SharedEngine,
    clean_window: Duration,
    context: CancelContext,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?clean_window, "Starting engine sweep task");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(clean_window) => {}
                _ = context.cancelled() => {
                    debug!("Engine sweep received cancellation");
                    return;
                }
            }

            let removed = {
                let mut guard = engine.write().await;
                match guard.as_mut() {
                    Some(engine) => engine.cleanup(Instant::now()),
                    None => {
                        debug!("Engine closed, sweep exiting");
                        return;
                    }
                }
            };

            if removed > 0 {
                info!(removed, "Engine sweep reclaimed outlived entries");
            } else {
                debug!("Engine sweep: no outlived entries found");
            }
        }
    })
}
