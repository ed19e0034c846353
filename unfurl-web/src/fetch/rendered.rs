use super::RenderedFetch;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use unfurl_common::{FetchError, FetchStage, Result, UnfurlError};
use unfurl_drivers::browser::{
    driver::UnfurlDriver,
    pool::{BrowserPool, RenderPermit},
};
use unfurl_drivers::DriverError;
use url::Url;

/// Renders a page in a fresh browser session per call.
///
/// The pool bounds how many sessions run at once. The session is closed on
/// every exit path once it has been launched. After a failure or
/// cancellation a command may still be in flight on the session, so the close
/// runs in a background task that keeps the pool slot until it finishes.
#[derive(Clone)]
pub struct RenderedFetcher {
    pool: Arc<BrowserPool>,
}

impl RenderedFetcher {
    pub fn new(pool: Arc<BrowserPool>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RenderedFetch for RenderedFetcher {
    async fn fetch_rendered(&self, url: &Url, cancel: &CancellationToken) -> Result<String> {
        let t0 = Instant::now();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UnfurlError::Cancelled),
            res = self.pool.initialize() => res.map_err(driver_failure)?,
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UnfurlError::Cancelled),
            res = self.pool.acquire() => res.map_err(driver_failure)?,
        };

        // A session still connecting when the token fires is abandoned to the
        // WebDriver endpoint's own session timeout.
        let options = self.pool.options();
        let driver = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UnfurlError::Cancelled),
            res = UnfurlDriver::launch(options) => res.map_err(driver_failure)?,
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UnfurlError::Cancelled),
            res = render(&driver, url, options.navigation_timeout) => res,
        };

        let close_deadline = options.launch_timeout + options.navigation_timeout;
        if outcome.is_ok() {
            teardown(driver, permit, close_deadline).await;
        } else {
            tokio::spawn(teardown(driver, permit, close_deadline));
        }

        match &outcome {
            Ok(markup) => tracing::info!(
                target: "browser.render",
                url = %url,
                bytes = markup.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "rendered"
            ),
            Err(e) => tracing::warn!(
                target: "browser.render",
                url = %url,
                error = %e,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "render failed"
            ),
        }
        outcome
    }
}

/// Close the session, bounded by `deadline`, then free the pool slot.
async fn teardown(driver: UnfurlDriver, permit: RenderPermit, deadline: Duration) {
    if tokio::time::timeout(deadline, driver.close()).await.is_err() {
        tracing::warn!(
            target: "browser.session",
            deadline_ms = deadline.as_millis() as u64,
            "browser session close timed out"
        );
    }
    drop(permit);
}

async fn render(driver: &UnfurlDriver, url: &Url, timeout: Duration) -> Result<String> {
    let page = driver.open_page().await.map_err(driver_failure)?;
    page.navigate(url.as_str(), timeout)
        .await
        .map_err(driver_failure)?;
    page.content().await.map_err(driver_failure)
}

/// Stage at which a driver error happened.
pub fn driver_stage(err: &DriverError) -> FetchStage {
    match err {
        DriverError::Launch(_) | DriverError::LaunchTimeout(_) => FetchStage::Launch,
        DriverError::OpenPage(_) => FetchStage::OpenPage,
        DriverError::Navigate { .. } | DriverError::NavigateTimeout { .. } => FetchStage::Navigate,
        DriverError::Content(_) => FetchStage::Content,
        DriverError::PoolTimeout(_) | DriverError::PoolClosed | DriverError::NotReady { .. } => {
            FetchStage::Pool
        }
    }
}

fn driver_failure(err: DriverError) -> UnfurlError {
    FetchError::new(driver_stage(&err), err.to_string()).into()
}
