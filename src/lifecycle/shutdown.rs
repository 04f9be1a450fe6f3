//! Shutdown coordination for the builder.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// One trigger stops everything: the orchestrator loop, the beacon
/// stream task, and any in-flight confirmation waits. The trigger is
/// latched, so tasks that start listening after it fired still observe
/// it — a plain broadcast channel alone would lose that message.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Latch for late subscribers.
    triggered: AtomicBool,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested.
    ///
    /// Completes immediately if the trigger already fired, so this is
    /// safe to await repeatedly and from tasks spawned after the fact.
    pub async fn cancelled(&self) {
        if self.is_triggered() {
            return;
        }
        let mut rx = self.tx.subscribe();
        // a trigger may have landed between the check and the subscription
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
