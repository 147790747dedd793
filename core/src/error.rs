//! Error types for the Moodle web-service client.
//!
//! # Design
//! Every failure is returned to the caller as exactly one `ApiError`; nothing
//! in this crate retries or recovers. Transport problems, undecodable bodies,
//! Moodle exception envelopes and service warnings each get their own variant
//! so a higher layer can decide what is worth retrying.

use thiserror::Error;

use crate::warning::Warnings;

/// Failures raised by a [`Transport`](crate::transport::Transport) before any
/// response body reaches the decoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the server could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The caller's deadline elapsed and the in-flight request was aborted.
    #[error("request timed out")]
    TimedOut,

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Errors returned by `MoodleClient::parse` and the blocking `Moodle` facade.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status other than 200.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The body is not JSON or does not match the endpoint's response shape.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// Moodle replied with its `{"exception", "errorcode", "message"}` envelope.
    #[error("{exception} ({errorcode}): {message}")]
    Exception {
        exception: String,
        errorcode: String,
        message: String,
    },

    /// The service answered but attached at least one warning.
    #[error("service returned {count} warning(s): {0}", count = .0.len())]
    ServiceWarning(Warnings),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
