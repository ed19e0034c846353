pub mod driver;
pub mod launch;
pub mod page;
pub mod pool;

use std::time::Duration;

/// Failures reported by the browser layer, one variant per stage.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("browser launch timed out after {0:?}")]
    LaunchTimeout(Duration),
    #[error("failed to open page: {0}")]
    OpenPage(String),
    #[error("failed to navigate to {url}: {message}")]
    Navigate { url: String, message: String },
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigateTimeout { url: String, timeout: Duration },
    #[error("failed to get page content: {0}")]
    Content(String),
    #[error("no browser slot became free within {0:?}")]
    PoolTimeout(Duration),
    #[error("browser pool is closed")]
    PoolClosed,
    #[error("webdriver endpoint {endpoint} is not ready: {message}")]
    NotReady { endpoint: String, message: String },
}
