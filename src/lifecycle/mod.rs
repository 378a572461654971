//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Open database → Build routes → Start listeners → Coordinator
//!
//! Coordinator (coordinator.rs):
//!     Running ──(API serve error | shutdown signal)──▶ Draining ──▶ Terminated
//!
//! Drain (drain.rs):
//!     Graceful stop ─┬─ done before deadline → clean
//!                    └─ deadline elapsed     → force close
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - Ordered startup: database first, listeners last
//! - Ordered shutdown: stop accept, drain, close database
//! - Shutdown has a deadline: forced close after it
//! - No globals: the shutdown source is passed in explicitly

pub mod coordinator;
pub mod drain;
pub mod shutdown;
pub mod signals;
pub mod startup;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, Outcome, Phase, TerminalEvent};
pub use drain::{drain, DrainOutcome, DrainReport, ListenerHandle};
pub use shutdown::{Shutdown, ShutdownSignal};
