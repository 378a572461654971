//! One-shot shutdown notifications.
//!
//! A [`Shutdown`] is the publishing side, a [`ShutdownSignal`] the observing
//! side. Publishing never blocks and is idempotent; a signal subscribed after
//! the trigger still observes it.

use std::sync::Arc;

use tokio::sync::watch;

/// Publishing side of a shutdown notification.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown notification.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.tx.subscribe(),
        }
    }

    /// Trigger the notification. Returns `true` only for the call that flipped it.
    pub fn trigger(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side of a shutdown notification.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait until the notification fires.
    ///
    /// Also returns when every [`Shutdown`] has been dropped, since nothing
    /// could trigger it any more.
    pub async fn wait(&mut self) {
        while !*self.receiver.borrow_and_update() {
            if self.receiver.changed().await.is_err() {
                break;
            }
        }
    }

    /// Check if shutdown was signaled (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}
