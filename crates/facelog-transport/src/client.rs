//! Authenticated API client.
//!
//! Every call goes through the same per-request state machine:
//!
//! ```text
//! lookup token -> attach -> send -> 2xx/4xx/5xx ............ done
//!                                -> 401 -> refresh -> token -> resend once -> done
//!                                                  -> none  -> local 401
//! ```
//!
//! A request is sent at most twice. A 401 on the second attempt is returned
//! as is.

use std::sync::Arc;

use facelog_core::{
    ApiRequest, ApiResponse, ClientConfig, StoreError, TokenStore, Transport, TransportError,
};
use facelog_session::SessionManager;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::ClientError,
    protocol::{
        AuthResponse, LOGIN_PATH, LoginRequest, REFRESH_PATH, REGISTER_PATH, RefreshRequest,
        RefreshResponse,
    },
};

/// Error message carried by the local 401 when no session can be restored.
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthorized. Please log in again.";

/// What to do after the first attempt.
#[derive(Debug)]
enum AuthOutcome {
    /// Hand this response to the caller.
    Success(ApiResponse),
    /// Resend once with this access token.
    RetryOnce(String),
    /// No session left; answer with a local 401.
    Fail,
}

/// HTTP client that attaches the session's bearer token and silently
/// refreshes it once when the backend answers 401.
pub struct ApiClient<S, T>
where
    S: TokenStore,
    T: Transport,
{
    config: ClientConfig,
    session: Arc<SessionManager<S>>,
    transport: T,
}

impl<S, T> ApiClient<S, T>
where
    S: TokenStore,
    T: Transport,
{
    /// Create a client over a shared session.
    #[must_use]
    pub const fn new(config: ClientConfig, session: Arc<SessionManager<S>>, transport: T) -> Self {
        Self {
            config,
            session,
            transport,
        }
    }

    /// Shared session handle.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager<S>> {
        &self.session
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Persist both tokens, overwriting the previous session.
    ///
    /// # Errors
    /// Returns error if the token store cannot be written.
    pub async fn save_session(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        self.session.save_session(access, refresh).await
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session.access_token().await
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.session.refresh_token().await
    }

    /// Delete both tokens.
    ///
    /// # Errors
    /// Returns error if the token store cannot be written.
    pub async fn clear_session(&self) -> Result<(), StoreError> {
        self.session.clear_session().await
    }

    /// End the session locally.
    ///
    /// # Errors
    /// Returns error if the token store cannot be written.
    pub async fn logout(&self) -> Result<(), StoreError> {
        tracing::info!("Logging out");
        self.clear_session().await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `None` without touching the network when no refresh token is
    /// held. Any failure (non-2xx, malformed body, transport error) clears
    /// the whole session and returns `None`. Never retries.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let _gate = self.session.refresh_gate().await;
        self.refresh_locked().await
    }

    /// Send `request` with the session's bearer token.
    ///
    /// `request.target` may be an absolute `http(s)` URL or a path relative
    /// to `<origin>/api`. When no session can be restored after a 401 the
    /// result is a local 401 with `{"error": ...}`, not an `Err`.
    ///
    /// # Errors
    /// Returns error only when the transport fails on the first or second
    /// attempt.
    pub async fn authenticated_fetch(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.config.resolve(&request.target);
        let mut request = request.with_target(url);

        let token = self.session.access_token().await;
        if let Some(token) = token.as_deref() {
            attach(&mut request, token)?;
        }

        tracing::debug!(
            method = %request.method,
            url = %request.target,
            authenticated = token.is_some(),
            "Sending request"
        );
        let response = self.transport.send(&request).await?;

        match self.next_step(response, token.as_deref()).await {
            AuthOutcome::Success(response) => Ok(response),
            AuthOutcome::RetryOnce(token) => {
                attach(&mut request, &token)?;
                tracing::debug!(url = %request.target, "Retrying with refreshed token");
                self.transport.send(&request).await
            }
            AuthOutcome::Fail => {
                tracing::debug!(url = %request.target, "Session unrecoverable, answering 401");
                Ok(ApiResponse::unauthenticated(UNAUTHENTICATED_MESSAGE))
            }
        }
    }

    /// GET `target` and decode the JSON body.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or undecodable body.
    pub async fn get_json<R: DeserializeOwned>(&self, target: &str) -> Result<R, ClientError> {
        self.send_json(ApiRequest::get(target)).await
    }

    /// POST `body` as JSON to `target` and decode the JSON reply.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or undecodable body.
    pub async fn post_json<B, R>(&self, target: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(target).json(body)?).await
    }

    /// PUT `body` as JSON to `target` and decode the JSON reply.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or undecodable body.
    pub async fn put_json<B, R>(&self, target: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send_json(ApiRequest::put(target).json(body)?).await
    }

    /// PATCH `body` as JSON to `target` and decode the JSON reply.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or undecodable body.
    pub async fn patch_json<B, R>(&self, target: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send_json(ApiRequest::patch(target).json(body)?).await
    }

    /// DELETE `target`, ignoring any response body.
    ///
    /// # Errors
    /// Returns error on transport failure or non-2xx status.
    pub async fn delete(&self, target: &str) -> Result<(), ClientError> {
        let response = self.authenticated_fetch(ApiRequest::delete(target)).await?;
        ensure_success(&response)
    }

    /// Log in with username and password and save the issued tokens.
    ///
    /// The current session is left untouched when the backend refuses.
    ///
    /// # Errors
    /// Returns [`ClientError::Rejected`] with the backend's error body on a
    /// non-2xx answer.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let request = ApiRequest::post(self.config.resolve(LOGIN_PATH)).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        self.authenticate(request).await
    }

    /// Register a new account and save the issued tokens.
    ///
    /// The account is logged in right away. The web registration page
    /// discards these tokens and sends the user to the login form instead.
    ///
    /// `payload` is sent verbatim; field validation belongs to the backend.
    ///
    /// # Errors
    /// Returns [`ClientError::Rejected`] with the backend's field errors on a
    /// non-2xx answer.
    pub async fn register(&self, payload: &Value) -> Result<AuthResponse, ClientError> {
        let request = ApiRequest::post(self.config.resolve(REGISTER_PATH)).json(payload)?;
        self.authenticate(request).await
    }

    async fn authenticate(&self, request: ApiRequest) -> Result<AuthResponse, ClientError> {
        let response = self.transport.send(&request).await?;
        let auth: AuthResponse = decode(&response)?;
        self.session.save_session(&auth.access, &auth.refresh).await?;
        tracing::info!("Session established");
        Ok(auth)
    }

    async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ClientError> {
        let response = self.authenticated_fetch(request).await?;
        decode(&response)
    }

    async fn next_step(&self, response: ApiResponse, sent: Option<&str>) -> AuthOutcome {
        if !response.is_unauthorized() {
            return AuthOutcome::Success(response);
        }
        match self.refresh_after_rejection(sent).await {
            Some(token) => AuthOutcome::RetryOnce(token),
            None => AuthOutcome::Fail,
        }
    }

    /// Refresh after the backend rejected `rejected`, unless a concurrent
    /// caller already replaced it while this one waited for the gate.
    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> Option<String> {
        let _gate = self.session.refresh_gate().await;
        if let Some(current) = self.session.access_token().await {
            if Some(current.as_str()) != rejected {
                tracing::debug!("Access token already refreshed by a concurrent request");
                return Some(current);
            }
        }
        self.refresh_locked().await
    }

    // Caller must hold the refresh gate.
    async fn refresh_locked(&self) -> Option<String> {
        let Some(refresh) = self.session.refresh_token().await else {
            tracing::debug!("No refresh token, skipping refresh");
            return None;
        };

        let request = match ApiRequest::post(self.config.resolve(REFRESH_PATH))
            .json(&RefreshRequest { refresh })
        {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Failed to encode refresh request: {e}");
                return None;
            }
        };

        let access = match self.transport.send(&request).await {
            Ok(response) if response.is_success() => match response.json::<RefreshResponse>() {
                Ok(body) if !body.access.is_empty() => Some(body.access),
                Ok(_) => {
                    tracing::warn!("Refresh response carried an empty access token");
                    None
                }
                Err(e) => {
                    tracing::warn!("Malformed refresh response: {e}");
                    None
                }
            },
            Ok(response) => {
                tracing::warn!(
                    status = response.status.as_u16(),
                    "Refresh token invalid or expired, clearing session"
                );
                None
            }
            Err(e) => {
                tracing::error!("Failed to refresh token: {e}");
                None
            }
        };

        let Some(access) = access else {
            if let Err(e) = self.session.clear_session().await {
                tracing::error!("Failed to clear session: {e}");
            }
            return None;
        };

        if let Err(e) = self.session.replace_access_token(&access).await {
            // The retry can still use the token; the next call refreshes again.
            tracing::error!("Failed to store refreshed access token: {e}");
        }
        tracing::debug!("Access token refreshed");
        Some(access)
    }
}

fn attach(request: &mut ApiRequest, token: &str) -> Result<(), TransportError> {
    request
        .set_bearer(Some(token))
        .map_err(|e| TransportError::InvalidRequest(format!("unusable access token: {e}")))
}

fn ensure_success(response: &ApiResponse) -> Result<(), ClientError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ClientError::Rejected {
            status: response.status,
            body: response.text(),
        })
    }
}

fn decode<R: DeserializeOwned>(response: &ApiResponse) -> Result<R, ClientError> {
    ensure_success(response)?;
    Ok(response.json()?)
}
