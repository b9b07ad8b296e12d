//! Error types for the Portainer client and stack reconciler.

use thiserror::Error;

use crate::types::EndpointId;

/// Errors that can occur while talking to Portainer.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication against `/api/auth` failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The endpoint has no swarm cluster behind it.
    #[error("no swarm cluster found for endpoint {endpoint}")]
    NotFound { endpoint: EndpointId },

    /// A domain call returned a non-2xx status.
    #[error("portainer API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Network-level failure (DNS, connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected schema.
    #[error("failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Base URL cannot carry the `/api/` root.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Reasons an authentication attempt was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credentials rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("auth endpoint unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("auth response carried an empty token")]
    EmptyToken,

    #[error("auth response is not a token: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Result type for client and reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;
