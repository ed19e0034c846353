//! Common types shared across the unfurl crates.
//!
//! This crate is intentionally lightweight so that every other crate can
//! depend on it without pulling in the HTTP or browser stacks.
//!
//! # Overview
//!
//! - [`ExtractedData`]: the preview record produced by an unfurl run
//! - [`UnfurlError`], [`FetchError`], [`FetchStage`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use unfurl_common::ExtractedData;
//!
//! let data = ExtractedData::default();
//! let json = serde_json::to_value(&data).unwrap();
//! assert_eq!(json["site"], "");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;

/// Preview metadata extracted from a page.
///
/// A missing signal is an empty string rather than `None`, so the JSON
/// encoding always carries all four keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedData {
    pub title: String,
    pub description: String,
    pub image: String,
    pub site: String,
}

/// Pipeline stage at which a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStage {
    /// Plain HTTP GET.
    Static,
    /// Waiting for a free browser slot.
    Pool,
    /// Starting the browser session.
    Launch,
    /// Opening a page in the browser session.
    OpenPage,
    /// Navigating to the URL and waiting for the load event.
    Navigate,
    /// Reading back the rendered document.
    Content,
}

impl FetchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStage::Static => "static",
            FetchStage::Pool => "pool",
            FetchStage::Launch => "launch",
            FetchStage::OpenPage => "open_page",
            FetchStage::Navigate => "navigate",
            FetchStage::Content => "content",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network, timeout, navigation or status failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} fetch failed{}: {message}", status_suffix(.status))]
pub struct FetchError {
    pub stage: FetchStage,
    /// HTTP status code, when the failure came from a non-success response.
    pub status: Option<u16>,
    pub message: String,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl FetchError {
    pub fn new(stage: FetchStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Error types used across the unfurl pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnfurlError {
    /// The input URL is malformed or not http(s).
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A fetch tier failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The markup could not be turned into a queryable document.
    #[error("failed to parse HTML document: {0}")]
    Parse(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl UnfurlError {
    /// Shorthand for a [`FetchError`] without a status code.
    pub fn fetch(stage: FetchStage, message: impl Into<String>) -> Self {
        UnfurlError::Fetch(FetchError::new(stage, message))
    }

    /// Stage of the failing fetch, if this is a fetch error.
    pub fn stage(&self) -> Option<FetchStage> {
        match self {
            UnfurlError::Fetch(e) => Some(e.stage),
            _ => None,
        }
    }

    /// HTTP status carried by a fetch error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            UnfurlError::Fetch(e) => e.status,
            _ => None,
        }
    }
}

/// Convenient alias for results that use [`UnfurlError`].
pub type Result<T> = std::result::Result<T, UnfurlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_serializes_all_keys() {
        let json = serde_json::to_value(ExtractedData::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["title", "description", "image", "site"] {
            assert_eq!(obj.get(key).and_then(|v| v.as_str()), Some(""));
        }
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn fetch_error_display_includes_stage_and_status() {
        let err = UnfurlError::from(
            FetchError::new(FetchStage::Static, "HTTP error").with_status(404),
        );
        assert_eq!(err.to_string(), "static fetch failed (status 404): HTTP error");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.stage(), Some(FetchStage::Static));
    }

    #[test]
    fn fetch_error_without_status() {
        let err = UnfurlError::fetch(FetchStage::Navigate, "timed out");
        assert_eq!(err.to_string(), "navigate fetch failed: timed out");
        assert_eq!(err.status(), None);
    }
}
