//! Run-level cancellation.
//!
//! A [`CancelSignal`] combines a latched flag (checked before dispatching
//! each action) with a broadcast channel (raced against in-flight work and
//! backoff sleeps). Once cancelled, a signal stays cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
    tx: broadcast::Sender<()>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Latch the flag and wake every subscriber.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Receiver for `select!`-style racing. Subscribe before starting the
    /// work that should be interruptible.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_latches_and_broadcasts() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());

        let mut rx = signal.subscribe();
        signal.cancel();

        assert!(signal.is_cancelled());
        rx.recv().await.expect("broadcast delivered");
        assert!(signal.is_cancelled(), "flag stays latched");
    }

    #[test]
    fn flag_visible_without_subscription() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        clone.cancel();
        assert!(signal.is_cancelled());
    }
}
