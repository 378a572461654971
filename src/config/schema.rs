//! Configuration schema definitions.
//!
//! Every setting is both a long flag and a `SALES_`-prefixed environment
//! variable. The types also derive `Serialize` so the effective configuration
//! can be logged at startup; secrets are skipped.

use std::fmt;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};
use serde::Serialize;

use crate::config::duration::{self, parse_duration};

const DEFAULT_WEB_ADDRESS: &str = "localhost:8000";
const DEFAULT_DEBUG_ADDRESS: &str = "localhost:6060";
const DEFAULT_DB_USER: &str = "db";
const DEFAULT_DB_PASSWORD: &str = "db";
const DEFAULT_DB_HOST: &str = "localhost:4343";
const DEFAULT_DB_NAME: &str = "db";

/// Command line of the service binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "sales-api", version, about = "Sales API service")]
pub struct Cli {
    #[command(flatten)]
    pub config: ServiceConfig,
}

/// Root configuration. Immutable once loaded.
#[derive(Debug, Clone, Default, Args, Serialize)]
pub struct ServiceConfig {
    #[command(flatten)]
    pub web: WebConfig,

    #[command(flatten)]
    pub db: DbConfig,

    #[command(flatten)]
    pub log: LogConfig,
}

/// Listener and shutdown settings.
#[derive(Debug, Clone, Args, Serialize)]
pub struct WebConfig {
    /// Address of the API listener.
    #[arg(long = "web-address", env = "SALES_WEB_ADDRESS", default_value = DEFAULT_WEB_ADDRESS)]
    pub address: String,

    /// Address of the diagnostics listener.
    #[arg(long = "web-debug", env = "SALES_WEB_DEBUG", default_value = DEFAULT_DEBUG_ADDRESS)]
    pub debug: String,

    /// Maximum time to read a request's headers.
    #[arg(
        long = "web-read-timeout",
        env = "SALES_WEB_READ_TIMEOUT",
        default_value = "5s",
        value_parser = parse_duration
    )]
    #[serde(serialize_with = "duration::serialize")]
    pub read_timeout: Duration,

    /// Maximum time for a handler to produce its response.
    #[arg(
        long = "web-write-timeout",
        env = "SALES_WEB_WRITE_TIMEOUT",
        default_value = "5s",
        value_parser = parse_duration
    )]
    #[serde(serialize_with = "duration::serialize")]
    pub write_timeout: Duration,

    /// Deadline for draining in-flight requests on shutdown.
    #[arg(
        long = "web-shutdown-timeout",
        env = "SALES_WEB_SHUTDOWN_TIMEOUT",
        default_value = "5s",
        value_parser = parse_duration
    )]
    #[serde(serialize_with = "duration::serialize")]
    pub shutdown_timeout: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_WEB_ADDRESS.to_string(),
            debug: DEFAULT_DEBUG_ADDRESS.to_string(),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Database connection parameters.
#[derive(Clone, Args, Serialize)]
pub struct DbConfig {
    #[arg(long = "db-user", env = "SALES_DB_USER", default_value = DEFAULT_DB_USER)]
    pub user: String,

    #[arg(
        long = "db-password",
        env = "SALES_DB_PASSWORD",
        default_value = DEFAULT_DB_PASSWORD,
        hide_env_values = true,
        hide_default_value = true
    )]
    #[serde(skip_serializing)]
    pub password: String,

    /// Database host as `host` or `host:port`.
    #[arg(long = "db-host", env = "SALES_DB_HOST", default_value = DEFAULT_DB_HOST)]
    pub host: String,

    #[arg(long = "db-name", env = "SALES_DB_NAME", default_value = DEFAULT_DB_NAME)]
    pub name: String,

    /// Connect without TLS.
    #[arg(
        long = "db-disable-tls",
        env = "SALES_DB_DISABLE_TLS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub disable_tls: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            host: DEFAULT_DB_HOST.to_string(),
            name: DEFAULT_DB_NAME.to_string(),
            disable_tls: true,
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("disable_tls", &self.disable_tls)
            .finish()
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Args, Serialize)]
pub struct LogConfig {
    #[arg(long = "log-format", env = "SALES_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
