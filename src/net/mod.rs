//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept loop, transient error backoff)
//!     → connection.rs (lifecycle tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind failures are reported before any task is spawned
//! - Each connection is tracked so draining knows when in-flight work is done

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
