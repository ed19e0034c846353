//! Driver layer for browser rendering.
//!
//! This crate wraps a WebDriver endpoint (chromedriver by default) so the
//! unfurl pipeline can obtain fully rendered markup for script-heavy pages.
//!
//! - [`browser::driver::UnfurlDriver`]: one browser session, launched per render
//! - [`browser::page::UnfurlPage`]: navigation and content read-back
//! - [`browser::launch::LaunchOptions`]: user agent, headless mode and timeouts
//! - [`browser::pool::BrowserPool`]: bounded admission to browser sessions and
//!   the one-time endpoint readiness check
pub mod browser;

pub use browser::DriverError;
