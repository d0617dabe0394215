//! Error types for the group client.

use thiserror::Error;

/// Errors raised while talking to the Spotinst API.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GroupError {
    /// Raised when the request never produced an HTTP response.
    #[error("transport failure calling {endpoint}: {message}")]
    Transport {
        /// Logical endpoint being called (for example `status`).
        endpoint: String,
        /// Underlying transport error.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("spotinst API returned {status} for {endpoint}: {message}")]
    Api {
        /// Logical endpoint being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Error messages reported by the API.
        message: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("failed to decode {endpoint} response: {message}")]
    Decode {
        /// Logical endpoint being called.
        endpoint: String,
        /// Decoder error.
        message: String,
    },
    /// Raised when a client cannot be constructed.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl GroupError {
    pub(crate) fn transport(endpoint: &str, err: &impl std::fmt::Display) -> Self {
        Self::Transport {
            endpoint: endpoint.to_owned(),
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(endpoint: &str, err: &impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.to_owned(),
            message: err.to_string(),
        }
    }
}
