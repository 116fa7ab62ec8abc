use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Error types for Web of Science client operations
#[derive(Error, Debug)]
pub enum WosError {
    /// Invalid client configuration (unsupported format, missing API key, ...)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The API answered with a non-success status
    ///
    /// Carries everything needed to diagnose the failed request: the status
    /// code, response headers and body, and the search parameters that were sent.
    #[error("Error when sending query: HTTP {status}: {body} (params: {params:?})")]
    QueryError {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
        params: Vec<(String, String)>,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML configuration parsing failed
    #[error("YAML parsing failed: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// XML parsing failed
    #[error("XML parsing failed: {0}")]
    XmlError(String),

    /// Required response metadata is missing or unreadable
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Invalid query structure or parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Refused to replace an existing output file
    #[error("Output file already exists: {path}")]
    OutputExists { path: String },

    /// IO error for file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// API rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded,
}

pub type Result<T> = result::Result<T, WosError>;

/// HTTP 504, the only status the API answers with when a search takes too long
pub(crate) const GATEWAY_TIMEOUT: u16 = 504;

impl WosError {
    /// HTTP status code of a failed query, if the error came from the API
    pub fn status(&self) -> Option<u16> {
        match self {
            WosError::QueryError { status, .. } => Some(*status),
            WosError::RequestError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        WosError::MalformedResponse {
            message: message.into(),
        }
    }
}

impl RetryableError for WosError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            WosError::QueryError {
                status: GATEWAY_TIMEOUT,
                ..
            }
        )
    }

    fn retry_reason(&self) -> &str {
        match self {
            WosError::QueryError {
                status: GATEWAY_TIMEOUT,
                ..
            } => "Gateway timeout",
            WosError::QueryError { .. } => "Query rejected by server",
            WosError::RequestError(_) => "Network error",
            WosError::JsonError(_) => "Invalid JSON response",
            WosError::XmlError(_) | WosError::MalformedResponse { .. } => "Invalid response",
            WosError::ConfigurationError(_) | WosError::YamlError(_) => "Invalid configuration",
            WosError::InvalidQuery(_) => "Invalid query",
            WosError::OutputExists { .. } | WosError::IoError(_) => "File system error",
            WosError::RateLimitExceeded => "Rate limit exceeded",
        }
    }
}
