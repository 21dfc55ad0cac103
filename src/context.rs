//! Cancellation Context
//!
//! A cloneable cancellation handle that ties the engine sweep to a lifecycle.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

#[derive(Debug)]
struct Node {
    tx: watch::Sender<bool>,
    children: Mutex<Vec<Weak<Node>>>,
    // Keeps ancestors alive so cancellation still reaches this node.
    _parent: Option<Arc<Node>>,
}

impl Node {
    fn new(parent: Option<Arc<Node>>) -> Arc<Self> {
        let (tx, _) = watch::channel(false);
        Arc::new(Self {
            tx,
            children: Mutex::new(Vec::new()),
            _parent: parent,
        })
    }

    fn cancel(&self) {
        // Flag first so a concurrent `child()` either sees it or is in the list.
        self.tx.send_replace(true);
        let children = std::mem::take(
            &mut *self.children.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Cancellation handle shared between the cache and its background sweep.
///
/// Clones observe the same state. A [`child`](CancelContext::child) is
/// cancelled by its own [`cancel`](CancelContext::cancel) or by any ancestor,
/// while cancelling a child leaves its parent untouched.
#[derive(Debug, Clone)]
pub struct CancelContext {
    node: Arc<Node>,
}

impl Default for CancelContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelContext {
    /// Creates a root context that is not cancelled.
    pub fn new() -> Self {
        Self {
            node: Node::new(None),
        }
    }

    /// Derives a context that is also cancelled when this one is.
    pub fn child(&self) -> Self {
        let child = Node::new(Some(Arc::clone(&self.node)));
        {
            let mut children = self
                .node
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        if self.node.is_cancelled() {
            child.cancel();
        }
        Self { node: child }
    }

    /// Cancels this context and every context derived from it. Idempotent.
    pub fn cancel(&self) {
        self.node.cancel();
    }

    /// Returns true once this context or an ancestor is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }

    /// Completes once this context or an ancestor is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.node.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
