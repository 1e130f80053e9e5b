//! One-shot readiness gate.
//!
//! The gate starts closed and opens the first time a discovery client asks
//! for the endpoint resource. The reconciliation loop waits on it before its
//! first tick so no snapshot is built before anyone is listening.

use std::sync::Arc;
use tokio::sync::watch;

/// Single-fire broadcast gate. Clones share the same underlying signal.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadinessGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Open the gate.
    ///
    /// Returns `true` if this call opened it, `false` if it was already open.
    pub fn signal(&self) -> bool {
        let opened = self.tx.send_if_modified(|signaled| {
            if *signaled {
                false
            } else {
                *signaled = true;
                true
            }
        });
        if opened {
            tracing::info!("readiness gate opened by first discovery request");
        }
        opened
    }

    /// Whether the gate has been opened.
    pub fn is_signaled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the gate is open. Returns immediately once it is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|signaled| *signaled).await;
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
