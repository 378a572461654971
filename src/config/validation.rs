//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Validate value ranges (shutdown deadline > 0, ports valid)
//! - Detect conflicting listener addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a loaded configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(message) = check_listen_address(&config.web.address) {
        errors.push(ValidationError::new("web.address", message));
    }
    if let Err(message) = check_listen_address(&config.web.debug) {
        errors.push(ValidationError::new("web.debug", message));
    }
    if config.web.address == config.web.debug {
        errors.push(ValidationError::new(
            "web.debug",
            "must differ from web.address",
        ));
    }
    if config.web.shutdown_timeout.is_zero() {
        errors.push(ValidationError::new(
            "web.shutdown_timeout",
            "must be greater than zero",
        ));
    }

    for (field, value) in [
        ("db.user", &config.db.user),
        ("db.host", &config.db.host),
        ("db.name", &config.db.name),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port`; IPv6 hosts must be bracketed. Use `0.0.0.0` for all interfaces.
fn check_listen_address(address: &str) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("{address:?} is missing a port"))?;
    port.parse::<u16>()
        .map_err(|_| format!("{address:?} has an invalid port {port:?}"))?;
    if host.is_empty() {
        return Err(format!("{address:?} is missing a host (use 0.0.0.0 for all interfaces)"));
    }
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(format!("{address:?} must bracket IPv6 hosts"));
    }
    Ok(())
}
