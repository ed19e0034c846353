use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use unfurl_common::{FetchStage, UnfurlError};
use unfurl_drivers::browser::{launch::LaunchOptions, pool::BrowserPool};
use unfurl_web::{RenderedFetch, RenderedFetcher};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SLOW_NAVIGATION: Duration = Duration::from_secs(5);

/// WebDriver endpoint whose navigation command hangs for `SLOW_NAVIGATION`.
async fn slow_webdriver() -> MockServer {
    let server = MockServer::start().await;
    let ok = |value: serde_json::Value| ResponseTemplate::new(200).set_body_json(json!({ "value": value }));

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ok(json!({ "ready": true, "message": "ok" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ok(json!({ "sessionId": "s1", "capabilities": { "browserName": "chrome" } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/timeouts"))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s1/url"))
        .respond_with(ok(json!("about:blank")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .respond_with(ok(json!(null)).set_delay(SLOW_NAVIGATION))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s1"))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;
    server
}

fn fetcher_for(server: &MockServer, navigation_timeout: Duration) -> (RenderedFetcher, Arc<BrowserPool>) {
    let options = LaunchOptions {
        webdriver_url: server.uri(),
        navigation_timeout,
        ..Default::default()
    };
    let pool = Arc::new(BrowserPool::new(options, 1, Duration::from_secs(1)));
    (RenderedFetcher::new(pool.clone()), pool)
}

#[tokio::test]
async fn cancellation_during_navigation_returns_promptly() {
    let server = slow_webdriver().await;
    let (fetcher, pool) = fetcher_for(&server, Duration::from_secs(15));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let cancelled_at = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
        Instant::now()
    });

    let url = Url::parse("https://example.com/").unwrap();
    let err = fetcher.fetch_rendered(&url, &cancel).await.unwrap_err();
    let returned_at = Instant::now();

    assert_eq!(err, UnfurlError::Cancelled);
    let cancelled_at = cancelled_at.await.unwrap();
    assert!(
        returned_at.duration_since(cancelled_at) < Duration::from_secs(1),
        "returned {:?} after cancellation",
        returned_at.duration_since(cancelled_at)
    );
    // The session is still being torn down and keeps its slot.
    assert_eq!(pool.available(), 0);
}

#[tokio::test]
async fn navigation_timeout_does_not_wait_for_session_close() {
    let server = slow_webdriver().await;
    let (fetcher, _pool) = fetcher_for(&server, Duration::from_secs(1));

    let started = Instant::now();
    let url = Url::parse("https://example.com/").unwrap();
    let err = fetcher
        .fetch_rendered(&url, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(FetchStage::Navigate));
    assert!(
        started.elapsed() < SLOW_NAVIGATION - Duration::from_secs(1),
        "returned after {:?}",
        started.elapsed()
    );
}
