//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line + SALES_* environment
//!     → loader.rs (clap parse, --help handling)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference to the startup sequence
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the service starts with no arguments
//! - Malformed or invalid settings are fatal; nothing is silently ignored

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from, render_config, ConfigError};
pub use schema::{DbConfig, LogConfig, LogFormat, ServiceConfig, WebConfig};
pub use validation::ValidationError;
