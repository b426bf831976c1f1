//! HTTP transport and authenticated API client.
//!
//! Provides:
//! - Wire payloads for the backend auth endpoints
//! - `ApiClient` - bearer attachment with one-shot silent refresh
//! - reqwest-backed transport (feature: reqwest)

pub mod client;
pub mod error;
pub mod protocol;

#[cfg(feature = "reqwest")]
pub mod http;

pub use client::{ApiClient, UNAUTHENTICATED_MESSAGE};
pub use error::ClientError;
pub use protocol::{AuthResponse, ErrorBody, LoginRequest, RefreshRequest, RefreshResponse};

#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
