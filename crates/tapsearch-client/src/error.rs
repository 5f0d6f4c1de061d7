use reqwest::StatusCode;
use tapsearch_core::SearchError;
use thiserror::Error;

/// Errors returned by the tapsearch API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the request (HTTP 400) or it failed local validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: StatusCode, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Coarse classification used by the selection state and fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    /// The service could not be reached or misbehaved.
    Upstream,
}

impl ClientError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::InvalidRequest(_) | ClientError::InvalidBaseUrl { .. } => {
                ErrorKind::InvalidRequest
            }
            ClientError::NotFound(_) => ErrorKind::NotFound,
            ClientError::Http(_)
            | ClientError::UnexpectedStatus { .. }
            | ClientError::Deserialize { .. } => ErrorKind::Upstream,
        }
    }
}

impl From<SearchError> for ClientError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::InvalidRequest(message) => ClientError::InvalidRequest(message),
            SearchError::NotFound(message) => ClientError::NotFound(message),
        }
    }
}
