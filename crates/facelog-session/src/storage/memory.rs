//! In-memory token storage.

use std::sync::RwLock;

use async_trait::async_trait;
use facelog_core::{StoreError, TokenPair, TokenSlot, TokenStore};

/// In-memory storage implementation.
///
/// Tokens live as long as the process. Nothing is written to disk, so a
/// restart always starts logged out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: RwLock<TokenPair>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token pair.
    #[must_use]
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: RwLock::new(TokenPair::new(Some(access.into()), Some(refresh.into()))),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, slot: TokenSlot) -> Result<Option<String>, StoreError> {
        Ok(self
            .tokens
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .get(slot)
            .map(ToOwned::to_owned))
    }

    async fn set(&self, slot: TokenSlot, value: &str) -> Result<(), StoreError> {
        self.tokens
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .set(slot, Some(value.to_string()));
        Ok(())
    }

    async fn remove(&self, slot: TokenSlot) -> Result<(), StoreError> {
        self.tokens
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .set(slot, None);
        Ok(())
    }

    async fn set_pair(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        *self
            .tokens
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))? =
            TokenPair::new(Some(access.to_string()), Some(refresh.to_string()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self
            .tokens
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))? = TokenPair::default();
        Ok(())
    }
}
