//! Adapter error types.

use thiserror::Error;

/// Errors that can occur while translating or dispatching a CRUD call.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a 4xx status and the collection asked for
    /// client errors to be surfaced.
    #[error("client error {status}: {body}")]
    ClientError { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// A CRUD method was called for a collection that was never registered.
    #[error("collection not registered: {collection}")]
    NotRegistered { collection: String },

    /// The verb mapping names a method the transport cannot issue.
    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    /// The configured protocol/host/port/path do not form a valid URI.
    #[error("invalid request URI: {0}")]
    InvalidUrl(String),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    /// Returns `true` if the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the failure is a caller/configuration mistake rather
    /// than something the store reported.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered { .. } | Self::UnsupportedMethod { .. } | Self::InvalidUrl(_)
        )
    }
}

impl From<url::ParseError> for AdapterError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
