//! Configuration loading from the command line and environment.

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::Parser;
use thiserror::Error;

use crate::config::schema::{Cli, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parsing config: {0}")]
    Parse(#[from] clap::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("generating config for output: {0}")]
    Render(#[from] toml::ser::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process arguments and environment.
///
/// Returns `Ok(None)` when the caller asked for `--help` or `--version`; the
/// text has already been printed and the process should exit successfully.
pub fn load_config() -> Result<Option<ServiceConfig>, ConfigError> {
    load_config_from(std::env::args_os())
}

/// Same as [`load_config`] with an explicit argument list (first item is the binary name).
pub fn load_config_from<I, T>(args: I) -> Result<Option<ServiceConfig>, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::Parse(e)),
    };

    validate_config(&cli.config).map_err(ConfigError::Validation)?;

    Ok(Some(cli.config))
}

/// Render the configuration for the startup log. Secrets are not included.
pub fn render_config(config: &ServiceConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string(config)?)
}
