//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error for {command}: {source}")]
    Transport {
        command: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("node returned HTTP {status} for {command}")]
    HttpStatus {
        command: String,
        status: u16,
        body: String,
    },

    /// The node answered 200 with an `error` or `exception` payload; the
    /// remote message is carried verbatim.
    #[error("node error for {command}: {message}")]
    Node { command: String, message: String },

    #[error("malformed response for {command}: {source}")]
    Json {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl RpcError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            RpcError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
