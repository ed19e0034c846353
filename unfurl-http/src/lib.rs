//! Minimal page-fetching HTTP client with safe logging.
//!
//! - One GET per call: no retries, no redirects beyond reqwest's default policy
//! - Fixed identifying `User-Agent` and a bounded per-request timeout
//! - Non-success statuses surface as [`HttpError::Status`] carrying the code
//! - Optional *raw* request/response logging via `UNFURL_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), unfurl_http::HttpError> {
//! use std::time::Duration;
//!
//! let client = unfurl_http::HttpClient::new("Mozilla/5.0 (compatible; UnfurlBot/1.0)", Duration::from_secs(10))?;
//! let html = client
//!     .get_text("https://example.com/", unfurl_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, a truncated body snippet, and final errors. Query
//! parameters that look like secrets are redacted before they are logged.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use reqwest::StatusCode;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "UNFURL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with the query redacted.
fn make_curl(url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string()];
    for (name, val) in headers.iter() {
        let v = val.to_str().unwrap_or("");
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    let (host_path, query) = redact_query(url);
    let query = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let scheme = url.scheme();
    if query.is_empty() {
        parts.push(format!("'{scheme}://{host_path}'"));
    } else {
        parts.push(format!("'{scheme}://{host_path}?{query}'"));
    }
    parts.join(" ")
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to read response: {0}")]
    Body(String),
    #[error("HTTP error: {status}")]
    Status {
        status: StatusCode,
        body_snippet: String,
        request_id: String,
    },
}

impl HttpError {
    /// Status code of a non-success response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs.
///
/// ```
/// use unfurl_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(2)),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 2);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    /// Overrides [`HttpClient::default_timeout`].
    pub timeout: Option<Duration>,
    /// Extra headers; a `User-Agent` here replaces the client's.
    pub headers: Option<HeaderMap>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: HeaderValue,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client that identifies itself with `user_agent`.
    ///
    /// ```no_run
    /// use unfurl_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("UnfurlBot/1.0", Duration::from_secs(10))?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(10));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(user_agent: &str, default_timeout: Duration) -> Result<Self, HttpError> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5).min(default_timeout))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            user_agent,
            default_timeout,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET `url` and return the body decoded as text.
    ///
    /// Fails on unparsable URLs, connection errors, timeouts, and any status
    /// outside 2xx. The body is not size-capped.
    pub async fn get_text(&self, url: &str, opts: RequestOpts) -> Result<String, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        if let Some(extra) = opts.headers {
            for (k, v) in extra.iter() {
                headers.insert(k, v.clone());
            }
        }

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let (host_path, redacted_q) = redact_query(&url);

        tracing::debug!(
            req_id=%req_id,
            method="GET",
            host_path=%host_path,
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&url, &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = Instant::now();
        let resp = self
            .inner
            .get(url.clone())
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| {
                let err = classify(err, timeout);
                tracing::warn!(req_id=%req_id, host_path=%host_path, error=%err, "http.network_error.send");
                err
            })?;

        let status = resp.status();
        let x_request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let body = resp.text().await.map_err(|err| {
            let err = if err.is_timeout() {
                HttpError::Timeout(timeout)
            } else {
                HttpError::Body(err.to_string())
            };
            tracing::warn!(req_id=%req_id, host_path=%host_path, error=%err, "http.network_error.body");
            err
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            content_type=%content_type,
            x_request_id=%x_request_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let truncated = body.len() > RAW_MAX_BODY;
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                body=%truncate_chars(&body, RAW_MAX_BODY),
                truncated
            );
        }

        let snippet = snip_body(&body);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return Ok(body);
        }

        tracing::warn!(
            req_id=%req_id,
            %status,
            host_path=%host_path,
            x_request_id=%x_request_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Status {
            status,
            body_snippet: snippet,
            request_id: x_request_id,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn classify(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else if err.is_builder() {
        HttpError::Build(err.to_string())
    } else {
        HttpError::Network(err.to_string())
    }
}

fn truncate_chars(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn snip_body(body: &str) -> String {
    if body.len() > SNIPPET_MAX {
        format!("{}...", truncate_chars(body, SNIPPET_MAX))
    } else {
        body.to_string()
    }
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = v.to_string();
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token"
                    | "authorization"
                    | "auth"
                    | "key"
                    | "api_key"
                    | "token"
                    | "secret"
                    | "client_secret"
                    | "bearer"
                    | "password"
                    | "sig"
                    | "signature"
            );
            (k, if is_secret { "<redacted>".into() } else { v })
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}
