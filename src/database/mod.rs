//! Database subsystem.
//!
//! # Responsibilities
//! - Turn `DbConfig` into Postgres connect options
//! - Own the connection pool for the life of the process
//! - Release it exactly once, after serving has stopped
//!
//! # Design Decisions
//! - The pool connects lazily; an unreachable database surfaces through
//!   `ping` (and the API health route), not as a startup failure
//! - The rest of the crate sees only the `DatabaseHandle` trait

pub mod guard;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use guard::DatabaseGuard;
pub use postgres::Database;

/// Error type for database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("invalid database host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("unable to connect to database: {0}")]
    Connect(#[from] sqlx::Error),
}

/// The capabilities the service needs from its database.
#[async_trait]
pub trait DatabaseHandle: Send + Sync + 'static {
    /// Round-trip to the server.
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Close every connection. Called once, after all serving has stopped.
    async fn close(&self);
}
