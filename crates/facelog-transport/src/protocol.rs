//! Wire payloads for the backend authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login endpoint, relative to the API root.
pub const LOGIN_PATH: &str = "/auth/login/";

/// Registration endpoint, relative to the API root.
pub const REGISTER_PATH: &str = "/auth/register/";

/// Token refresh endpoint, relative to the API root.
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// Body of a login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of a token refresh request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Body of a successful token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Body of a successful login or registration.
///
/// `user` and `student_profile` are passed through as raw JSON; their shape
/// belongs to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub student_profile: Option<Value>,
}

/// Body of the locally built unauthenticated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
