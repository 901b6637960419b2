//! Typed errors for the fetch, model, configuration and batch layers.
//!
//! The imprint pipeline itself never fails: these errors are converted into
//! error markers on the result at the stage boundary.

use thiserror::Error;

/// Errors from fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    #[error("connection error for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("TLS error for {url}: {message}")]
    Tls { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("WebDriver error for {url}: {message}")]
    WebDriver { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors from the language model collaborator
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model request timed out")]
    Timeout,

    #[error("model endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("rate limited by model endpoint")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<LlmError> },
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("environment variable {0} is not set; an API key is required")]
    MissingApiKey(String),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that abort a whole batch run
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("could not read input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("input CSV has no columns")]
    NoColumns,

    #[error("output error: {0}")]
    Sink(#[from] SinkError),

    #[error("could not set up fetcher: {0}")]
    Fetch(#[from] FetchError),

    #[error("could not set up language model: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors writing results
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SinkError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
