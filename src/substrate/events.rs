//! Instance lifecycle notifications.
//!
//! # State Transitions
//! ```text
//! Inactive → Active:   first successful response          → Started
//! Active   → Inactive: no traffic for sleep_after          → Stopped
//! any      → Inactive: transport failure                   → Error
//! ```
//!
//! Events are fire-and-forget on a broadcast channel; with no subscriber
//! they are dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time;

use crate::substrate::{BackendName, BackendRegistry};

/// A lifecycle notification emitted by the substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceEvent {
    Started { backend: BackendName },
    Stopped { backend: BackendName, idle: Duration },
    Error { backend: BackendName, message: String },
}

/// Per-instance activity tracker.
#[derive(Debug)]
pub struct Activity {
    backend: BackendName,
    epoch: Instant,
    last_seen_ms: AtomicU64,
    active: AtomicBool,
    events: broadcast::Sender<InstanceEvent>,
}

impl Activity {
    pub fn new(backend: BackendName, events: broadcast::Sender<InstanceEvent>) -> Self {
        Self {
            backend,
            epoch: Instant::now(),
            last_seen_ms: AtomicU64::new(0),
            active: AtomicBool::new(false),
            events,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The instance answered a request.
    pub fn record_success(&self) {
        self.last_seen_ms.store(self.elapsed_ms(), Ordering::Release);
        if !self.active.swap(true, Ordering::AcqRel) {
            let _ = self.events.send(InstanceEvent::Started {
                backend: self.backend.clone(),
            });
        }
    }

    /// The instance could not be reached.
    pub fn record_failure(&self, message: impl Into<String>) {
        self.active.store(false, Ordering::Release);
        let _ = self.events.send(InstanceEvent::Error {
            backend: self.backend.clone(),
            message: message.into(),
        });
    }

    /// Mark the instance stopped if it has been idle for at least `sleep_after`.
    /// Returns true when a transition happened.
    pub fn sleep_if_idle(&self, sleep_after: Duration) -> bool {
        if !self.is_active() {
            return false;
        }

        let last_seen = self.last_seen_ms.load(Ordering::Acquire);
        let idle = Duration::from_millis(self.elapsed_ms().saturating_sub(last_seen));
        if idle < sleep_after {
            return false;
        }

        if self.active.swap(false, Ordering::AcqRel) {
            let _ = self.events.send(InstanceEvent::Stopped {
                backend: self.backend.clone(),
                idle,
            });
            return true;
        }
        false
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Periodically sweeps instances and reports idle ones as stopped.
pub struct IdleMonitor {
    registry: Arc<BackendRegistry>,
    sleep_after: Duration,
    interval: Duration,
}

impl IdleMonitor {
    pub fn new(registry: Arc<BackendRegistry>, sleep_after: Duration, interval: Duration) -> Self {
        Self {
            registry,
            sleep_after,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            sleep_after_secs = self.sleep_after.as_secs(),
            "Idle monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep(),
                _ = shutdown.recv() => {
                    tracing::info!("Idle monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn sweep(&self) {
        for (name, instance) in self.registry.instances() {
            if let Some(activity) = instance.activity() {
                if activity.sleep_if_idle(self.sleep_after) {
                    tracing::debug!(backend = %name, "Instance went idle");
                }
            }
        }
    }
}

/// Log lifecycle events until shutdown.
pub async fn log_events(
    mut events: broadcast::Receiver<InstanceEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(InstanceEvent::Started { backend }) => {
                    tracing::info!(backend = %backend, "Container started");
                }
                Ok(InstanceEvent::Stopped { backend, idle }) => {
                    tracing::info!(backend = %backend, idle_secs = idle.as_secs(), "Container stopping");
                }
                Ok(InstanceEvent::Error { backend, message }) => {
                    tracing::error!(backend = %backend, error = %message, "Container error");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Lifecycle event log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
