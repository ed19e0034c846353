use crate::browser::{
    launch::{build_capabilities, LaunchOptions},
    page::UnfurlPage,
    DriverError,
};
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, warn};

/// Thin wrapper around a `fantoccini` WebDriver session.
///
/// One driver is one browser session. Callers own its lifetime and must
/// call [`UnfurlDriver::close`] on every exit path.
pub struct UnfurlDriver {
    client: Client,
    options: LaunchOptions,
}

impl UnfurlDriver {
    /// Start a new browser session on the configured WebDriver endpoint,
    /// bounded by `options.launch_timeout`.
    pub async fn launch(options: &LaunchOptions) -> Result<Self, DriverError> {
        let caps = build_capabilities(options);

        let connect = async {
            ClientBuilder::native()
                .capabilities(caps)
                .connect(&options.webdriver_url)
                .await
        };

        let client = match tokio::time::timeout(options.launch_timeout, connect).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(DriverError::Launch(e.to_string())),
            Err(_) => return Err(DriverError::LaunchTimeout(options.launch_timeout)),
        };

        debug!(
            target: "browser.session",
            endpoint = %options.webdriver_url,
            headless = options.headless,
            "browser session started"
        );

        Ok(Self {
            client,
            options: options.clone(),
        })
    }

    /// Open a page in this session. The user agent was fixed at launch.
    pub async fn open_page(&self) -> Result<UnfurlPage, DriverError> {
        let page = UnfurlPage::new(self.client.clone());
        page.apply_timeouts(self.options.navigation_timeout).await?;
        Ok(page)
    }

    /// Close the underlying browser session. Failures are logged, not returned.
    pub async fn close(self) {
        match self.client.close().await {
            Ok(()) => debug!(target: "browser.session", "browser session closed"),
            Err(e) => warn!(target: "browser.session", error = %e, "failed to close browser session"),
        }
    }
}
