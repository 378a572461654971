//! Sales API service library.
//!
//! # Architecture Overview
//!
//! ```text
//!   main ─▶ config ─▶ lifecycle::startup
//!                          │
//!          ┌───────────────┼──────────────────────┐
//!          ▼               ▼                      ▼
//!     database        diagnostics            http::ApiServer
//!   (PgPool guard)   (/debug/*, best       (net::Listener, one task
//!                      effort)               per connection)
//!          │                                      │
//!          └──────────▶ lifecycle::Coordinator ◀──┘
//!                        ▲      (first of: serve error | signal,
//!                        │       then drain with deadline,
//!             lifecycle::signals  then close database)
//! ```

pub mod config;
pub mod database;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use error::Error;
pub use lifecycle::{Coordinator, Outcome, Shutdown};
