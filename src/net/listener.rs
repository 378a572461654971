//! TCP listener with bind-time failure reporting.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Retry per-connection accept failures with backoff
//! - Surface everything else as a terminal error

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

const ACCEPT_BACKOFF_START: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address` (`host:port`; the host may be a name).
    pub async fn bind(address: &str) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            address: address.to_string(),
            source,
        };

        let inner = TcpListener::bind(address).await.map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Accept the next connection.
    ///
    /// Failures that concern only the connection being accepted are retried
    /// with exponential backoff; any other failure is returned.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let mut backoff = ACCEPT_BACKOFF_START;
        loop {
            match self.inner.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!(peer_addr = %addr, "Connection accepted");
                    return Ok((stream, addr));
                }
                Err(e) if is_transient(&e) => {
                    tracing::warn!(error = %e, retry_in = ?backoff, "Accept failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(ACCEPT_BACKOFF_MAX);
                }
                Err(e) => return Err(ListenerError::Accept(e)),
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Hand the socket to a server that runs its own accept loop.
    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
