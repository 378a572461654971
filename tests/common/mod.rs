//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sales_api::config::ServiceConfig;
use sales_api::database::{DatabaseError, DatabaseHandle};
use tokio::net::{TcpListener, TcpStream};

/// Reserve a free loopback address. The port is released before returning.
pub async fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().to_string()
}

/// Config with free loopback ports and the given drain deadline.
pub async fn test_config(shutdown_timeout: Duration) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.web.address = free_addr().await;
    config.web.debug = free_addr().await;
    config.web.write_timeout = Duration::from_secs(30);
    config.web.shutdown_timeout = shutdown_timeout;
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Wait until something accepts connections on `addr`.
pub async fn wait_for_listener(addr: &str) {
    let mut delay = Duration::from_millis(10);
    for _ in 0..20 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(delay).await;
        delay = std::cmp::min(delay * 2, Duration::from_millis(200));
    }
    panic!("nothing listening on {addr}");
}

/// Database stand-in: configurable ping latency, observable close.
#[derive(Clone)]
pub struct FakeDb {
    inner: Arc<FakeDbInner>,
}

struct FakeDbInner {
    ping_delay: Duration,
    closes: AtomicUsize,
    closed_at: Mutex<Option<Instant>>,
    watch_addr: Option<String>,
    api_reachable_at_close: AtomicBool,
}

impl FakeDb {
    pub fn new(ping_delay: Duration) -> Self {
        Self::build(ping_delay, None)
    }

    /// Also check, at close time, whether `api_addr` still accepts connections.
    pub fn probing(ping_delay: Duration, api_addr: &str) -> Self {
        Self::build(ping_delay, Some(api_addr.to_string()))
    }

    fn build(ping_delay: Duration, watch_addr: Option<String>) -> Self {
        Self {
            inner: Arc::new(FakeDbInner {
                ping_delay,
                closes: AtomicUsize::new(0),
                closed_at: Mutex::new(None),
                watch_addr,
                api_reachable_at_close: AtomicBool::new(false),
            }),
        }
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn closed_at(&self) -> Option<Instant> {
        *self.inner.closed_at.lock().unwrap()
    }

    pub fn api_reachable_at_close(&self) -> bool {
        self.inner.api_reachable_at_close.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseHandle for FakeDb {
    async fn ping(&self) -> Result<(), DatabaseError> {
        tokio::time::sleep(self.inner.ping_delay).await;
        Ok(())
    }

    async fn close(&self) {
        if let Some(addr) = &self.inner.watch_addr {
            let reachable = TcpStream::connect(addr).await.is_ok();
            self.inner
                .api_reachable_at_close
                .store(reachable, Ordering::SeqCst);
        }
        *self.inner.closed_at.lock().unwrap() = Some(Instant::now());
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
    }
}
