use crate::browser::DriverError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::Client;
use std::time::Duration;
use tracing::debug;

/// A page inside a browser session.
pub struct UnfurlPage {
    client: Client,
}

impl UnfurlPage {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub(crate) async fn apply_timeouts(&self, page_load: Duration) -> Result<(), DriverError> {
        self.client
            .update_timeouts(TimeoutConfiguration::new(None, Some(page_load), None))
            .await
            .map_err(|e| DriverError::OpenPage(e.to_string()))
    }

    /// Navigate to `url` and wait for the load event.
    ///
    /// The WebDriver session enforces its own page-load timeout; `timeout`
    /// is also applied locally so a wedged endpoint cannot hold the call.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        match tokio::time::timeout(timeout, self.client.goto(url)).await {
            Ok(Ok(())) => {
                debug!(target: "browser.page", %url, "navigation complete");
                Ok(())
            }
            Ok(Err(e)) => Err(DriverError::Navigate {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(DriverError::NavigateTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    /// Return the fully rendered document markup.
    pub async fn content(&self) -> Result<String, DriverError> {
        self.client
            .source()
            .await
            .map_err(|e| DriverError::Content(e.to_string()))
    }
}
