//! Two-tier fetch decision.
//!
//! - popular (script-heavy) hosts go straight to the browser
//! - everything else is fetched statically first, and re-fetched in the
//!   browser when that fails or the markup looks like a client-rendered shell
//!
//! At most one fallback per call; neither tier retries.

use crate::fetch::{RenderedFetch, StaticFetch};
use crate::spa::SpaHeuristic;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use unfurl_common::{Result, UnfurlError};
use url::Url;

pub struct FetchStrategy {
    static_fetcher: Arc<dyn StaticFetch>,
    rendered_fetcher: Arc<dyn RenderedFetch>,
    popular_hosts: Vec<String>,
    spa: SpaHeuristic,
}

impl FetchStrategy {
    pub fn new(
        static_fetcher: Arc<dyn StaticFetch>,
        rendered_fetcher: Arc<dyn RenderedFetch>,
        popular_hosts: &[String],
        spa: SpaHeuristic,
    ) -> Self {
        Self {
            static_fetcher,
            rendered_fetcher,
            popular_hosts: popular_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            spa,
        }
    }

    /// Substring match of `host` against the popular-host list.
    pub fn is_popular_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.popular_hosts.iter().any(|p| host.contains(p.as_str()))
    }

    /// Fetch the markup for `url`, choosing the tier(s) as described above.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        let target = parse_target(url)?;
        let host = target.host_str().unwrap_or_default();

        if self.is_popular_host(host) {
            tracing::debug!(target: "unfurl.strategy", %host, "popular host, rendering");
            return self.rendered_fetcher.fetch_rendered(&target, cancel).await;
        }

        match self.static_fetcher.fetch_static(&target, cancel).await {
            Ok(markup) if !self.spa.looks_client_rendered(&markup) => {
                tracing::debug!(target: "unfurl.strategy", %host, bytes = markup.len(), "static markup accepted");
                Ok(markup)
            }
            Ok(markup) => {
                tracing::info!(target: "unfurl.strategy", %host, bytes = markup.len(), "client-rendered shell, falling back to browser");
                self.rendered_fetcher.fetch_rendered(&target, cancel).await
            }
            Err(UnfurlError::Cancelled) => Err(UnfurlError::Cancelled),
            Err(e) => {
                tracing::info!(target: "unfurl.strategy", %host, error = %e, "static fetch failed, falling back to browser");
                self.rendered_fetcher.fetch_rendered(&target, cancel).await
            }
        }
    }
}

/// Parse `raw` as an absolute http(s) URL with a host.
pub fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UnfurlError::InvalidUrl(format!("{raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(UnfurlError::InvalidUrl(format!(
                "{raw:?}: unsupported scheme {other:?}"
            )));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UnfurlError::InvalidUrl(format!("{raw:?}: missing host")));
    }
    Ok(url)
}
