//! The two fetch tiers.
//!
//! Both take a [`CancellationToken`]; when it fires the tier stops waiting
//! and returns [`UnfurlError::Cancelled`](unfurl_common::UnfurlError::Cancelled).

pub mod rendered;
pub mod static_fetch;

use tokio_util::sync::CancellationToken;
use unfurl_common::Result;
use url::Url;

pub use rendered::RenderedFetcher;
pub use static_fetch::StaticFetcher;

/// Plain network GET of the page markup.
#[async_trait::async_trait]
pub trait StaticFetch: Send + Sync {
    async fn fetch_static(&self, url: &Url, cancel: &CancellationToken) -> Result<String>;
}

/// Markup after the page has been executed in a browser.
#[async_trait::async_trait]
pub trait RenderedFetch: Send + Sync {
    async fn fetch_rendered(&self, url: &Url, cancel: &CancellationToken) -> Result<String>;
}
