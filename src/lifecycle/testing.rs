//! Test doubles for the lifecycle core.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::database::{DatabaseError, DatabaseHandle};
use crate::lifecycle::drain::ListenerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    GracefulStop,
    GracefulDone,
    ForceClose,
    DbClose,
}

/// Ordered log of calls with the (possibly paused) time each happened.
#[derive(Debug, Clone)]
pub struct Recorder {
    start: Instant,
    calls: Arc<Mutex<Vec<(Call, Instant)>>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            calls: Arc::default(),
        }
    }
}

impl Recorder {
    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn elapsed_at(&self, call: Call) -> Option<Duration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| *c == call)
            .map(|(_, at)| *at - self.start)
    }
}

/// Listener whose graceful stop takes a fixed time, or never finishes.
pub struct FakeListener {
    stop_after: Option<Duration>,
    recorder: Recorder,
}

impl FakeListener {
    pub fn with_stop_after(stop_after: Duration, recorder: Recorder) -> Self {
        Self {
            stop_after: Some(stop_after),
            recorder,
        }
    }

    pub fn never_stops(recorder: Recorder) -> Self {
        Self {
            stop_after: None,
            recorder,
        }
    }
}

#[async_trait]
impl ListenerHandle for FakeListener {
    async fn graceful_stop(&self) {
        self.recorder.record(Call::GracefulStop);
        match self.stop_after {
            Some(after) => {
                if !after.is_zero() {
                    tokio::time::sleep(after).await;
                }
                self.recorder.record(Call::GracefulDone);
            }
            None => std::future::pending::<()>().await,
        }
    }

    async fn force_close(&self) {
        self.recorder.record(Call::ForceClose);
    }
}

pub struct FakeDatabase {
    recorder: Recorder,
}

impl FakeDatabase {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

#[async_trait]
impl DatabaseHandle for FakeDatabase {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close(&self) {
        self.recorder.record(Call::DbClose);
    }
}
