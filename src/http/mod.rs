//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! net::Listener (bound socket)
//!     → server.rs (accept loop, per-connection hyper tasks, stop/force)
//!     → request.rs (request ID, metrics)
//!     → routes.rs (API route table)
//!     → Send to client
//! ```

pub mod request;
pub mod routes;
pub mod server;

pub use request::{RequestUuid, X_REQUEST_ID};
pub use routes::build_router;
pub use server::{ApiServer, ServeError, ServeResult, ServerHandle};
