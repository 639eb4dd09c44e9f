//! Error types for talking to the remote API.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the remote query client and the fetch flows built on it.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("remote returned HTTP {status}: {body}")]
    Transport { status: StatusCode, body: String },

    /// The GraphQL response carried a non-empty `errors` list.
    #[error("query failed: {message}")]
    Query {
        message: String,
        /// Number of further error messages reported after the first.
        additional: usize,
    },

    /// The response body could not be decoded.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ApiError {
    pub(crate) fn decode(context: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { context, source }
    }
}
