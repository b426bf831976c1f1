//! Session lifecycle and token pair types.

use serde::{Deserialize, Serialize};

use crate::TokenSlot;

/// Lifecycle of a client-side session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing saved since the session was opened, and nothing found in the
    /// store when it was.
    Init,
    /// A refresh token is held.
    Active,
    /// Cleared by logout or an irrecoverable refresh failure.
    Cleared,
}

/// Snapshot of both token slots.
///
/// Empty strings are normalized to `None` on construction, so a present
/// value is always usable as a bearer credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl TokenPair {
    #[must_use]
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self {
            access: non_empty(access),
            refresh: non_empty(refresh),
        }
    }

    #[must_use]
    pub fn get(&self, slot: TokenSlot) -> Option<&str> {
        match slot {
            TokenSlot::Access => self.access.as_deref(),
            TokenSlot::Refresh => self.refresh.as_deref(),
        }
    }

    pub fn set(&mut self, slot: TokenSlot, value: Option<String>) {
        let value = non_empty(value);
        match slot {
            TokenSlot::Access => self.access = value,
            TokenSlot::Refresh => self.refresh = value,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

/// Treat an empty string the same as a missing one.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
