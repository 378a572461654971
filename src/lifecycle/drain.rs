//! Bounded drain of a listener.
//!
//! A race between the listener's graceful stop and a deadline timer. The
//! first to finish decides the path; the other is dropped.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Shutdown operations of a running listener.
///
/// Both are called at most once, from the coordinator, while the listener's
/// own task keeps running independently.
#[async_trait]
pub trait ListenerHandle: Send + Sync {
    /// Stop accepting connections and wait until in-flight work has finished.
    /// Must return immediately when nothing is in flight.
    async fn graceful_stop(&self);

    /// Terminate every connection now and wait until the listener has stopped.
    async fn force_close(&self);
}

/// Which path a drain took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// In-flight work finished before the deadline.
    Graceful,
    /// The deadline elapsed (or was zero) and connections were force-closed.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub outcome: DrainOutcome,
    pub elapsed: Duration,
}

/// Drain `listener`, escalating to a forced close once `deadline` elapses.
pub async fn drain<L>(listener: &L, deadline: Duration) -> DrainReport
where
    L: ListenerHandle + ?Sized,
{
    let start = Instant::now();

    if deadline.is_zero() {
        tracing::warn!("Shutdown deadline is zero, forcing close");
        listener.force_close().await;
        return DrainReport {
            outcome: DrainOutcome::Forced,
            elapsed: start.elapsed(),
        };
    }

    let outcome = tokio::select! {
        _ = listener.graceful_stop() => DrainOutcome::Graceful,
        _ = tokio::time::sleep(deadline) => DrainOutcome::Forced,
    };

    if outcome == DrainOutcome::Forced {
        tracing::warn!(
            deadline = ?deadline,
            "Graceful shutdown did not complete in time, forcing close"
        );
        listener.force_close().await;
    }

    DrainReport {
        outcome,
        elapsed: start.elapsed(),
    }
}
