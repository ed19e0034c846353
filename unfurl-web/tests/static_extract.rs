use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use unfurl_common::{FetchStage, UnfurlError};
use unfurl_config::{FetchSettings, PopularHosts};
use unfurl_web::{
    FetchStrategy, MetadataExtractor, RenderedFetch, SpaHeuristic, StaticFetch, StaticFetcher,
    Unfurler,
};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Rendering is unavailable in these tests.
struct NoBrowser;

#[async_trait::async_trait]
impl RenderedFetch for NoBrowser {
    async fn fetch_rendered(&self, _url: &Url, _cancel: &CancellationToken) -> unfurl_common::Result<String> {
        Err(UnfurlError::fetch(FetchStage::Launch, "no browser in tests"))
    }
}

fn article() -> String {
    format!(
        r#"<!doctype html>
<html><head>
  <title>Fallback title</title>
  <meta property="og:title" content="Rust Link Previews">
  <meta name="description" content="How unfurling works.">
  <meta property="og:image" content="/static/cover.jpg">
  <meta property="og:site_name" content="Example Blog">
</head><body>{}</body></html>"#,
        "<p>Body text of a server-rendered article, long enough to count.</p>".repeat(30)
    )
}

fn unfurler() -> Unfurler {
    let fetcher = StaticFetcher::from_config(&FetchSettings::default()).unwrap();
    let strategy = FetchStrategy::new(
        Arc::new(fetcher),
        Arc::new(NoBrowser),
        &PopularHosts::default().0,
        SpaHeuristic::default(),
    );
    Unfurler::new(strategy, MetadataExtractor::with_defaults().unwrap())
}

#[tokio::test]
async fn static_page_is_unfurled_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .and(header("user-agent", "Mozilla/5.0 (compatible; UnfurlBot/1.0)"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/posts/1", server.uri());
    let data = unfurler().unfurl(&url, &CancellationToken::new()).await.unwrap();

    assert_eq!(data.title, "Rust Link Previews");
    assert_eq!(data.description, "How unfurling works.");
    assert_eq!(data.image, format!("{}/static/cover.jpg", server.uri()));
    assert_eq!(data.site, "Example Blog");
}

#[tokio::test]
async fn shell_page_falls_back_and_reports_render_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><div id="app"></div></body></html>"#),
        )
        .mount(&server)
        .await;

    let err = unfurler()
        .unfurl(&server.uri(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(FetchStage::Launch));
}

#[tokio::test]
async fn static_status_is_carried_by_the_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = StaticFetcher::from_config(&FetchSettings::default()).unwrap();
    let url = Url::parse(&server.uri()).unwrap();
    let err = fetcher
        .fetch_static(&url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(FetchStage::Static));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_static_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = unfurler().unfurl(&server.uri(), &cancel).await.unwrap_err();
    assert_eq!(err, UnfurlError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(4));
}
