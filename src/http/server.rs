//! API server: the primary listener process.
//!
//! # Responsibilities
//! - Serve an Axum router on a bound listener, one task per connection
//! - Enforce the header read timeout on every connection
//! - Report the accept loop's terminal status exactly once
//! - Stop gracefully (finish in-flight requests) or force-close on request
//!
//! # Design Decisions
//! - Connections are served with hyper-util directly rather than
//!   `axum::serve`, so they can be dropped individually on a forced close
//! - Stop and force are one-shot notifications; the server task and each
//!   connection task observe them independently of the caller

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use crate::lifecycle::drain::ListenerHandle;
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::net::{ConnectionGuard, ConnectionTracker, Listener, ListenerError};

/// Terminal error of the API server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Accept(#[from] ListenerError),

    #[error("server task ended without reporting a result")]
    Aborted,
}

/// Receives the accept loop's terminal status. `Ok(())` means it was stopped.
pub type ServeResult = oneshot::Receiver<Result<(), ServeError>>;

/// HTTP server for the API.
pub struct ApiServer {
    router: Router,
    read_timeout: Duration,
    tracker: ConnectionTracker,
}

impl ApiServer {
    pub fn new(router: Router, read_timeout: Duration, tracker: ConnectionTracker) -> Self {
        Self {
            router,
            read_timeout,
            tracker,
        }
    }

    /// Start serving on `listener`. Returns immediately.
    pub fn start(self, listener: Listener) -> (ServerHandle, ServeResult) {
        let (result_tx, result_rx) = oneshot::channel();
        let handle = ServerHandle {
            local_addr: listener.local_addr(),
            stop: Shutdown::new(),
            force: Shutdown::new(),
            stopped: Shutdown::new(),
            tracker: self.tracker.clone(),
        };

        let task = ServeTask {
            router: self.router,
            read_timeout: self.read_timeout,
            tracker: self.tracker,
            stop: handle.stop.subscribe(),
            force: handle.force.subscribe(),
            stopped: handle.stopped.clone(),
        };
        tokio::spawn(task.run(listener, result_tx));

        (handle, result_rx)
    }
}

/// Control handle of a running [`ApiServer`].
///
/// Dropping it stops the server and closes its connections.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: Shutdown,
    force: Shutdown,
    stopped: Shutdown,
    tracker: ConnectionTracker,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently open.
    pub fn active_connections(&self) -> usize {
        self.tracker.active_count()
    }

    /// Whether the server task has fully finished.
    pub fn is_stopped(&self) -> bool {
        self.stopped.is_triggered()
    }
}

#[async_trait]
impl ListenerHandle for ServerHandle {
    async fn graceful_stop(&self) {
        if self.stop.trigger() {
            tracing::info!(address = %self.local_addr, "Stopping API server");
        }
        self.stopped.subscribe().wait().await;
    }

    async fn force_close(&self) {
        self.stop.trigger();
        if self.force.trigger() {
            tracing::warn!(
                address = %self.local_addr,
                connections = self.tracker.active_count(),
                "Force-closing API connections"
            );
        }
        self.stopped.subscribe().wait().await;
    }
}

struct ServeTask {
    router: Router,
    read_timeout: Duration,
    tracker: ConnectionTracker,
    stop: ShutdownSignal,
    force: ShutdownSignal,
    stopped: Shutdown,
}

impl ServeTask {
    async fn run(
        mut self,
        listener: Listener,
        result_tx: oneshot::Sender<Result<(), ServeError>>,
    ) {
        let address = listener.local_addr();
        tracing::info!(address = %address, "API server starting");

        let conn_stop = self.stop.clone();
        let exit = loop {
            tokio::select! {
                _ = self.stop.wait() => break Ok(()),
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let conn = Connection {
                            guard: self.tracker.track(),
                            peer,
                            router: self.router.clone(),
                            read_timeout: self.read_timeout,
                            stop: conn_stop.clone(),
                            force: self.force.clone(),
                        };
                        tokio::spawn(conn.serve(stream));
                    }
                    Err(e) => break Err(ServeError::from(e)),
                },
            }
        };
        drop(listener);

        match &exit {
            Ok(()) => tracing::info!(address = %address, "API server stopped accepting"),
            Err(e) => tracing::error!(address = %address, error = %e, "API server accept loop failed"),
        }
        let _ = result_tx.send(exit);

        // Open connections keep being served until a stop is requested.
        self.stop.wait().await;
        self.tracker.wait_idle().await;

        tracing::info!(address = %address, "API server stopped");
        self.stopped.trigger();
    }
}

struct Connection {
    guard: ConnectionGuard,
    peer: SocketAddr,
    router: Router,
    read_timeout: Duration,
    stop: ShutdownSignal,
    force: ShutdownSignal,
}

impl Connection {
    async fn serve(mut self, stream: TcpStream) {
        let id = self.guard.id();
        tracing::debug!(connection_id = %id, peer_addr = %self.peer, "Serving connection");

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.read_timeout);

        let service = TowerToHyperService::new(self.router);
        let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
        tokio::pin!(conn);

        let mut draining = false;
        loop {
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(e) = result {
                        tracing::debug!(connection_id = %id, error = %e, "Connection error");
                    }
                    break;
                }
                _ = self.stop.wait(), if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
                _ = self.force.wait() => {
                    tracing::debug!(connection_id = %id, "Connection force-closed");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn start(router: Router) -> (ServerHandle, ServeResult) {
        let listener = Listener::bind("127.0.0.1:0").await.unwrap();
        ApiServer::new(router, Duration::from_secs(5), ConnectionTracker::new()).start(listener)
    }

    #[tokio::test]
    async fn graceful_stop_with_no_connections_is_immediate() {
        let (server, result) = start(Router::new().route("/", get(|| async { "ok" }))).await;

        tokio::time::timeout(Duration::from_millis(500), server.graceful_stop())
            .await
            .expect("idle server should stop at once");

        assert!(server.is_stopped());
        assert!(matches!(result.await, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn serves_requests() {
        let (server, _result) = start(Router::new().route("/", get(|| async { "ok" }))).await;

        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("ok"));
        server.graceful_stop().await;
    }

    #[tokio::test]
    async fn idle_keep_alive_connection_does_not_delay_stop() {
        let (server, _result) = start(Router::new().route("/", get(|| async { "ok" }))).await;

        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: test\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 256];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0);
        assert_eq!(server.active_connections(), 1);

        tokio::time::timeout(Duration::from_millis(500), server.graceful_stop())
            .await
            .expect("idle keep-alive connection should close on stop");
        assert_eq!(server.active_connections(), 0);
    }

    #[tokio::test]
    async fn force_close_drops_in_flight_connection() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let (server, _result) = start(router).await;

        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        stream
            .write_all(b"GET /slow HTTP/1.1\r\nHost: test\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(server.active_connections(), 1);

        tokio::time::timeout(Duration::from_millis(500), server.force_close())
            .await
            .expect("force close should not wait for the handler");

        let mut buf = Vec::new();
        let n = stream.read_to_end(&mut buf).await.unwrap_or(0);
        assert_eq!(n, 0, "no response expected from a force-closed connection");
        assert!(server.is_stopped());
    }
}
