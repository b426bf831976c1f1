//! Session manager owning the token pair.

use std::sync::RwLock;

use facelog_core::{SessionState, StoreError, TokenSlot, TokenStore, session::non_empty};
use tokio::sync::{Mutex, MutexGuard};

/// Owns the client-side session: both tokens, their storage backend and the
/// session lifecycle.
///
/// Meant to be created once by the application and shared (`Arc`) with every
/// client that needs authenticated access.
pub struct SessionManager<S>
where
    S: TokenStore,
{
    store: S,
    state: RwLock<SessionState>,
    refresh_gate: Mutex<()>,
}

impl<S> SessionManager<S>
where
    S: TokenStore,
{
    /// Open a manager over `store`, which may already hold a session.
    ///
    /// The session starts `Active` when a refresh token is found and `Init`
    /// otherwise.
    pub async fn open(store: S) -> Self {
        let manager = Self {
            store,
            state: RwLock::new(SessionState::Init),
            refresh_gate: Mutex::new(()),
        };
        if manager.refresh_token().await.is_some() {
            manager.set_state(SessionState::Active);
        }
        manager
    }

    /// Persist both tokens, overwriting the previous session.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    pub async fn save_session(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        self.store.set_pair(access, refresh).await?;
        self.set_state(SessionState::Active);
        tracing::debug!("Session saved");
        Ok(())
    }

    /// Replace the access token, leaving the refresh token in place.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    pub async fn replace_access_token(&self, access: &str) -> Result<(), StoreError> {
        self.store.set(TokenSlot::Access, access).await
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.read(TokenSlot::Access).await
    }

    /// Current refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.read(TokenSlot::Refresh).await
    }

    /// Delete both tokens.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    pub async fn clear_session(&self) -> Result<(), StoreError> {
        self.store.clear().await?;
        self.set_state(SessionState::Cleared);
        tracing::debug!("Session cleared");
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .map_or(SessionState::Cleared, |state| *state)
    }

    /// Whether a refresh token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.refresh_token().await.is_some()
    }

    /// Acquire the refresh gate.
    ///
    /// Holders run at most one token refresh at a time against this session.
    pub async fn refresh_gate(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }

    /// Underlying storage backend.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn read(&self, slot: TokenSlot) -> Option<String> {
        match self.store.get(slot).await {
            Ok(value) => non_empty(value),
            Err(e) => {
                tracing::error!("Failed to read {slot} token: {e}");
                None
            }
        }
    }

    fn set_state(&self, next: SessionState) {
        match self.state.write() {
            Ok(mut state) => *state = next,
            Err(e) => tracing::error!("Session state lock poisoned: {e}"),
        }
    }
}
