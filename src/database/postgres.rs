//! Postgres-backed [`DatabaseHandle`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use crate::config::DbConfig;
use crate::database::{DatabaseError, DatabaseHandle};

const DEFAULT_PORT: u16 = 5432;
const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection pool for the service database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Build the pool. No connection is made until first use.
    pub fn open(config: &DbConfig) -> Result<Self, DatabaseError> {
        let options = connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            name = %config.name,
            tls = !config.disable_tls,
            "Database pool created"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseHandle for Database {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_options(config: &DbConfig) -> Result<PgConnectOptions, DatabaseError> {
    let (host, port) = split_host(&config.host)?;
    let ssl_mode = if config.disable_tls {
        PgSslMode::Disable
    } else {
        PgSslMode::Require
    };

    Ok(PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(ssl_mode)
        .options([("timezone", "utc")]))
}

fn split_host(host: &str) -> Result<(&str, u16), DatabaseError> {
    let invalid = |reason: &str| DatabaseError::InvalidHost {
        host: host.to_string(),
        reason: reason.to_string(),
    };

    if host.is_empty() {
        return Err(invalid("empty"));
    }
    // Bare IPv6 literal without a port.
    if host.matches(':').count() > 1 && !host.starts_with('[') {
        return Ok((host, DEFAULT_PORT));
    }
    match host.rsplit_once(':') {
        Some((name, port)) => {
            let port = port.parse().map_err(|_| invalid("port is not a number"))?;
            let name = name.trim_start_matches('[').trim_end_matches(']');
            if name.is_empty() {
                return Err(invalid("missing host name"));
            }
            Ok((name, port))
        }
        None => Ok((host, DEFAULT_PORT)),
    }
}
