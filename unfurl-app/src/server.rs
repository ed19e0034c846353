//! HTTP surface.
//!
//! - `GET  /api/v1/health`
//! - `POST /api/v1/unfurl` with `{"url": "..."}`
//!
//! Errors are returned as `{"error": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use unfurl_common::{ExtractedData, UnfurlError};
use unfurl_web::Unfurler;

#[derive(Clone)]
pub struct AppState {
    unfurler: Arc<Unfurler>,
    /// Root token; each request runs under a child of it.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(unfurler: Arc<Unfurler>, shutdown: CancellationToken) -> Self {
        Self { unfurler, shutdown }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/unfurl", post(unfurl))
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Serve until the state's shutdown token is cancelled, then drain.
///
/// The browser pool is closed as soon as shutdown starts, so renders still
/// queued for a slot fail instead of launching new sessions.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let unfurler = state.unfurler.clone();
    let drain = {
        let unfurler = unfurler.clone();
        async move {
            shutdown.cancelled().await;
            unfurler.close();
        }
    };
    axum::serve(listener, router(state))
        .with_graceful_shutdown(drain)
        .await?;
    tracing::info!(renderer_closed = unfurler.is_closed(), "unfurl server stopped");
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct Health {
    status: String,
    timestamp: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "OK!".to_string(),
        timestamp: chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    })
}

#[derive(Debug, Deserialize)]
struct UnfurlRequest {
    url: String,
}

async fn unfurl(
    State(state): State<AppState>,
    payload: Result<Json<UnfurlRequest>, JsonRejection>,
) -> Result<Json<ExtractedData>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let cancel = state.shutdown.child_token();
    let data = state.unfurler.unfurl(&req.url, &cancel).await?;
    Ok(Json(data))
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub fn status_for(err: &UnfurlError) -> StatusCode {
    match err {
        UnfurlError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        UnfurlError::Fetch(_) => StatusCode::BAD_GATEWAY,
        UnfurlError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        UnfurlError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        UnfurlError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<UnfurlError> for ApiError {
    fn from(err: UnfurlError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::warn!(error = %err, stage = ?err.stage(), "unfurl failed");
        } else {
            tracing::debug!(error = %err, "unfurl rejected");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
