//! Core traits for token storage and HTTP transport.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ApiRequest, ApiResponse};

/// One of the two named token slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSlot {
    /// Short-lived credential sent with each request.
    Access,
    /// Longer-lived credential exchanged for a new access token.
    Refresh,
}

impl TokenSlot {
    /// Storage key for this slot.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for token storage backends.
///
/// A backend holds at most one value per [`TokenSlot`]. Writes to one slot
/// never touch the other.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read a slot.
    async fn get(&self, slot: TokenSlot) -> Result<Option<String>, StoreError>;

    /// Write a slot, overwriting any previous value.
    async fn set(&self, slot: TokenSlot, value: &str) -> Result<(), StoreError>;

    /// Delete a slot. Deleting an empty slot is not an error.
    async fn remove(&self, slot: TokenSlot) -> Result<(), StoreError>;

    /// Write both slots.
    async fn set_pair(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        self.set(TokenSlot::Access, access).await?;
        self.set(TokenSlot::Refresh, refresh).await
    }

    /// Delete both slots.
    async fn clear(&self) -> Result<(), StoreError> {
        self.remove(TokenSlot::Access).await?;
        self.remove(TokenSlot::Refresh).await
    }
}

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Trait for HTTP transports.
///
/// Implementations perform exactly one network exchange per call and never
/// retry. Any HTTP status, including 401, is a successful return.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request whose target is an absolute URL.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}
