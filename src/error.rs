//! Crate-wide error type.
//!
//! Most of these never leave their module: fetch and parse errors are
//! absorbed by the source adapters, translation errors by
//! [`crate::translate::translate_content`], delivery errors by the pipeline.
//! Only history persistence errors are allowed to reach `main`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewsError>;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API key not configured")]
    MissingApiKey,

    #[error("empty response from {0}")]
    EmptyResponse(&'static str),
}
