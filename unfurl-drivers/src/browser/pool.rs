//! Bounded admission to browser sessions.
//!
//! Every rendered fetch still launches and closes its own session; the pool
//! only caps how many exist at once. Callers beyond the cap queue for up to
//! `queue_timeout` and then fail with [`DriverError::PoolTimeout`].
//!
//! [`BrowserPool::initialize`] is the explicit one-time startup step: it
//! checks that the WebDriver endpoint answers `GET /status` with
//! `ready: true`. A success is remembered for the life of the pool; a
//! failure is not, so the next call probes again.

use crate::browser::{launch::LaunchOptions, DriverError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BrowserPool {
    options: LaunchOptions,
    slots: Arc<Semaphore>,
    capacity: usize,
    queue_timeout: Duration,
    ready: OnceCell<()>,
    probe: reqwest::Client,
}

/// Held for the duration of one browser session; dropping it frees the slot.
#[derive(Debug)]
pub struct RenderPermit {
    _permit: OwnedSemaphorePermit,
}

impl BrowserPool {
    pub fn new(options: LaunchOptions, capacity: usize, queue_timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            options,
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            queue_timeout,
            ready: OnceCell::new(),
            probe: reqwest::Client::new(),
        }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    /// Probe the WebDriver endpoint once; later calls return immediately.
    pub async fn initialize(&self) -> Result<(), DriverError> {
        self.ready
            .get_or_try_init(|| async {
                self.probe_endpoint().await?;
                info!(
                    target: "browser.pool",
                    endpoint = %self.options.webdriver_url,
                    capacity = self.capacity,
                    "webdriver endpoint ready"
                );
                Ok::<(), DriverError>(())
            })
            .await
            .map(|_| ())
    }

    async fn probe_endpoint(&self) -> Result<(), DriverError> {
        let endpoint = format!("{}/status", self.options.webdriver_url.trim_end_matches('/'));
        let not_ready = |message: String| DriverError::NotReady {
            endpoint: endpoint.clone(),
            message,
        };

        let resp = self
            .probe
            .get(&endpoint)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| not_ready(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(not_ready(format!("status {}", resp.status())));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| not_ready(e.to_string()))?;
        let ready = body
            .get("value")
            .and_then(|v| v.get("ready"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if ready {
            Ok(())
        } else {
            let message = body
                .get("value")
                .and_then(|v| v.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("endpoint reported ready=false")
                .to_string();
            Err(not_ready(message))
        }
    }

    /// Wait for a free slot, at most `queue_timeout`.
    pub async fn acquire(&self) -> Result<RenderPermit, DriverError> {
        let t0 = Instant::now();
        let wait = tokio::time::timeout(self.queue_timeout, self.slots.clone().acquire_owned());
        let permit = match wait.await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(DriverError::PoolClosed),
            Err(_) => return Err(DriverError::PoolTimeout(self.queue_timeout)),
        };
        debug!(
            target: "browser.pool",
            waited_ms = t0.elapsed().as_millis() as u64,
            available = self.available(),
            "browser slot acquired"
        );
        Ok(RenderPermit { _permit: permit })
    }

    /// Refuse all further acquisitions; queued callers fail with [`DriverError::PoolClosed`].
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}
