//! Link unfurling: fetch a page and extract its preview metadata.
//!
//! - Fetch tiers, static and browser-rendered (`fetch`)
//! - The tier decision (`strategy`) and its SPA heuristic (`spa`)
//! - Selector-chain metadata extraction (`extract`) over `document`
//! - Image URL normalization (`resolve`)
//!
//! [`Unfurler`] composes the pieces from an [`UnfurlConfig`].

pub mod document;
pub mod extract;
pub mod fetch;
pub mod resolve;
pub mod spa;
pub mod strategy;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use unfurl_common::{ExtractedData, Result, UnfurlError};
use unfurl_config::UnfurlConfig;
use unfurl_drivers::browser::{launch::LaunchOptions, pool::BrowserPool};

pub use extract::MetadataExtractor;
pub use fetch::{RenderedFetch, RenderedFetcher, StaticFetch, StaticFetcher};
pub use spa::SpaHeuristic;
pub use strategy::FetchStrategy;

/// Fetch + extract pipeline.
pub struct Unfurler {
    strategy: FetchStrategy,
    extractor: MetadataExtractor,
    pool: Option<Arc<BrowserPool>>,
}

impl Unfurler {
    pub fn new(strategy: FetchStrategy, extractor: MetadataExtractor) -> Self {
        Self {
            strategy,
            extractor,
            pool: None,
        }
    }

    /// Build the full pipeline, including the browser pool, from `cfg`.
    pub fn from_config(cfg: &UnfurlConfig) -> Result<Self> {
        let launch = LaunchOptions {
            webdriver_url: cfg.renderer.webdriver_url.clone(),
            user_agent: cfg.fetch.user_agent.clone(),
            headless: cfg.renderer.headless,
            launch_timeout: Duration::from_secs(cfg.renderer.launch_timeout_secs),
            navigation_timeout: Duration::from_secs(cfg.renderer.navigation_timeout_secs),
        };
        let pool = Arc::new(BrowserPool::new(
            launch,
            cfg.renderer.max_concurrent,
            Duration::from_secs(cfg.renderer.queue_timeout_secs),
        ));

        let strategy = FetchStrategy::new(
            Arc::new(StaticFetcher::from_config(&cfg.fetch)?),
            Arc::new(RenderedFetcher::new(pool.clone())),
            &cfg.popular_hosts.0,
            SpaHeuristic::from_config(&cfg.heuristics),
        );
        let extractor = MetadataExtractor::from_config(&cfg.selectors)?;

        Ok(Self {
            strategy,
            extractor,
            pool: Some(pool),
        })
    }

    /// One-time renderer startup check. A no-op without a browser pool.
    pub async fn initialize(&self) -> Result<()> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };
        pool.initialize().await.map_err(|e| {
            UnfurlError::from(unfurl_common::FetchError::new(
                fetch::rendered::driver_stage(&e),
                e.to_string(),
            ))
        })
    }

    /// Refuse further rendered fetches; callers still queued for a browser
    /// slot fail at the pool stage.
    pub fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.as_ref().is_some_and(|p| p.is_closed())
    }

    /// Fetch `url` and extract its preview metadata.
    pub async fn unfurl(&self, url: &str, cancel: &CancellationToken) -> Result<ExtractedData> {
        let markup = self.strategy.fetch(url, cancel).await?;
        let data = self.extractor.extract(&markup, url.trim())?;
        tracing::debug!(
            target: "unfurl.extract",
            url = %url,
            has_title = !data.title.is_empty(),
            has_description = !data.description.is_empty(),
            has_image = !data.image.is_empty(),
            "extracted"
        );
        Ok(data)
    }
}
