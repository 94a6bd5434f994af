//! Unified error type for wx-logger.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Feed returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Fetch failed after {attempts} attempts: {last}")]
    FetchExhausted { attempts: u32, last: Box<Error> },

    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("No entry matched location {0}")]
    LocationNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
