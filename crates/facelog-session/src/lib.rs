//! Session ownership and token storage.
//!
//! Provides:
//! - `SessionManager` - Owns the token pair and its lifecycle
//! - Storage implementations (memory, file)

pub mod manager;
pub mod storage;

pub use manager::SessionManager;
