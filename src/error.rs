//! Crate-level error type.
//!
//! Every subsystem owns its own error enum; this one only composes them so the
//! top-level run routine has a single value to hand back to `main`.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::http::ServeError;
use crate::net::listener::ListenerError;

/// Final error of a service run. `main` exits non-zero iff it gets one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("database: {0}")]
    Database(#[from] DatabaseError),

    #[error("starting API listener: {0}")]
    Bind(#[from] ListenerError),

    #[error("listening and serving: {0}")]
    Serve(#[from] ServeError),

    #[error("graceful shutdown did not complete in {deadline:?}, connections were force-closed")]
    ShutdownTimeout { deadline: Duration },
}

impl Error {
    /// Whether the service stopped because the drain deadline elapsed.
    pub fn is_shutdown_timeout(&self) -> bool {
        matches!(self, Error::ShutdownTimeout { .. })
    }
}
