//! Scoped ownership of the database handle.
//!
//! The guard is the only thing allowed to close the database. `release` closes
//! it on the normal path; if the guard is dropped without being released
//! (early return, panic unwinding through the run routine) the close is
//! handed to the runtime instead.

use std::sync::Arc;

use crate::database::DatabaseHandle;

/// Owns a database handle and closes it exactly once.
pub struct DatabaseGuard<D: DatabaseHandle> {
    handle: Arc<D>,
    armed: bool,
}

impl<D: DatabaseHandle> DatabaseGuard<D> {
    pub fn new(handle: D) -> Self {
        Self {
            handle: Arc::new(handle),
            armed: true,
        }
    }

    /// Shared access for request handlers. Clones never close the database.
    pub fn handle(&self) -> Arc<D> {
        Arc::clone(&self.handle)
    }

    /// Close the database and wait for it.
    pub async fn release(mut self) {
        self.armed = false;
        self.handle.close().await;
        tracing::info!("Database closed");
    }
}

impl<D: DatabaseHandle> Drop for DatabaseGuard<D> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!("Database guard dropped without release, closing in background");
        let handle = Arc::clone(&self.handle);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    handle.close().await;
                });
            }
            Err(_) => tracing::error!("No runtime available to close the database"),
        }
    }
}
