use super::StaticFetch;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use unfurl_common::{FetchError, FetchStage, Result, UnfurlError};
use unfurl_config::FetchSettings;
use unfurl_http::{HttpClient, HttpError, RequestOpts};
use url::Url;

/// Single GET with the configured user agent and timeout. Never retries.
#[derive(Clone)]
pub struct StaticFetcher {
    http: HttpClient,
}

impl StaticFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(settings: &FetchSettings) -> Result<Self> {
        let http = HttpClient::new(
            &settings.user_agent,
            Duration::from_secs(settings.static_timeout_secs),
        )
        .map_err(|e| UnfurlError::Config(format!("fetch: {e}")))?;
        Ok(Self::new(http))
    }
}

#[async_trait::async_trait]
impl StaticFetch for StaticFetcher {
    async fn fetch_static(&self, url: &Url, cancel: &CancellationToken) -> Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UnfurlError::Cancelled),
            res = self.http.get_text(url.as_str(), RequestOpts::default()) => {
                res.map_err(|e| UnfurlError::from(static_failure(&e)))
            }
        }
    }
}

fn static_failure(err: &HttpError) -> FetchError {
    let fe = FetchError::new(FetchStage::Static, err.to_string());
    match err.status() {
        Some(status) => fe.with_status(status.as_u16()),
        None => fe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_the_code() {
        let err = HttpError::Status {
            status: reqwest_status(404),
            body_snippet: String::new(),
            request_id: "r".into(),
        };
        let fe = static_failure(&err);
        assert_eq!(fe.stage, FetchStage::Static);
        assert_eq!(fe.status, Some(404));
    }

    #[test]
    fn transport_errors_have_no_status() {
        let fe = static_failure(&HttpError::Timeout(Duration::from_secs(10)));
        assert_eq!(fe.status, None);
        assert!(fe.message.contains("timed out"));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let fetcher = StaticFetcher::from_config(&FetchSettings::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // Port 9 (discard) is never contacted: the biased select sees the token first.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher.fetch_static(&url, &cancel).await.unwrap_err();
        assert_eq!(err, UnfurlError::Cancelled);
    }

    fn reqwest_status(code: u16) -> unfurl_http::StatusCode {
        unfurl_http::StatusCode::from_u16(code).unwrap()
    }
}
