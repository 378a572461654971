//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, from `main`
//! - Configure log level from `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, text format for development

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "sales_api=info,tower_http=info";

/// Install the global subscriber.
pub fn init(format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(filter)
        .with((format == LogFormat::Text).then(|| fmt::layer().with_file(true).with_line_number(true)))
        .with((format == LogFormat::Json).then(|| fmt::layer().json()))
        .try_init()
}
