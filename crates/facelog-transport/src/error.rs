//! Client error type.

use facelog_core::{StatusCode, StoreError, TransportError};
use thiserror::Error;

/// Error returned by the JSON helpers and the login/register calls.
///
/// [`ApiClient::authenticated_fetch`](crate::ApiClient::authenticated_fetch)
/// only ever fails with a [`TransportError`]; an expired session there is a
/// 401 response, not an error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
