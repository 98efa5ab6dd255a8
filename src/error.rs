// src/error.rs
use thiserror::Error;

/// Failures at the backend API boundary. These never escape the resource
/// facade: callers receive notifications plus safe empty values instead.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network/transport level failure (DNS, connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; carries the backend's structured error message
    /// when one was present in the payload.
    #[error("backend returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// 401 on an auth-gated call. The client's only move is a login redirect.
    #[error("session expired or not authenticated")]
    Unauthenticated,

    /// 2xx response whose payload was missing expected fields.
    #[error("malformed response payload: {0}")]
    Payload(String),
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }
}
