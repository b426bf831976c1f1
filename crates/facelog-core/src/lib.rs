//! Core types for the facelog session client.
//!
//! This crate provides the fundamental building blocks:
//! - `ApiRequest` / `ApiResponse` - HTTP call descriptors
//! - `ClientConfig` - Backend origin and transport settings
//! - `SessionState` / `TokenPair` - Session lifecycle and token snapshot
//! - Token storage and transport traits

pub mod config;
pub mod request;
pub mod session;
pub mod traits;

pub use config::{ClientConfig, ConfigError};
pub use http::{self, HeaderMap, HeaderValue, Method, StatusCode, header};
pub use request::{ApiRequest, ApiResponse};
pub use session::{SessionState, TokenPair};
pub use traits::{StoreError, TokenSlot, TokenStore, Transport, TransportError};
