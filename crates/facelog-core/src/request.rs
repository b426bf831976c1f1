//! Outbound request and inbound response descriptors.

use bytes::Bytes;
use http::{
    HeaderMap, HeaderValue, Method, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

/// Outbound HTTP call descriptor.
///
/// `target` is either an absolute `http(s)` URL or a path relative to the
/// API root. The client resolves it before handing the request to a
/// [`Transport`](crate::Transport).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub target: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ApiRequest {
    /// Create a request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    #[must_use]
    pub fn patch(target: impl Into<String>) -> Self {
        Self::new(Method::PATCH, target)
    }

    #[must_use]
    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Set a header, replacing every previous value with the same name.
    #[must_use]
    pub fn header(mut self, name: http::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    ///
    /// # Errors
    /// Returns error if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    /// Replace the target with an already resolved URL.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set `Authorization: Bearer <token>`, or drop the header entirely when
    /// there is no token.
    ///
    /// # Errors
    /// Returns error if `token` contains bytes not allowed in a header.
    pub fn set_bearer(&mut self, token: Option<&str>) -> Result<(), InvalidHeaderValue> {
        match token {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
            }
            None => {
                self.headers.remove(AUTHORIZATION);
            }
        }
        Ok(())
    }

    /// Bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Inbound HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Locally built 401 carrying `{"error": message}`.
    ///
    /// Returned when re-authentication is impossible; no network call
    /// produced it.
    #[must_use]
    pub fn unauthenticated(message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::new(StatusCode::UNAUTHORIZED, headers, body)
    }

    /// True for any 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    /// Returns error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_replaces_case_insensitively() {
        let request = ApiRequest::get("/courses/")
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer old"))
            .header(http::header::ACCEPT, HeaderValue::from_static("application/json"))
            .header(
                http::HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer new"),
            );

        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(request.headers["AUTHORIZATION"], "Bearer new");
        assert_eq!(request.headers["accept"], "application/json");
    }

    #[test]
    fn test_set_bearer_none_removes_header() {
        let mut request = ApiRequest::get("/courses/")
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
        request.set_bearer(None).unwrap();
        assert!(request.headers.get(AUTHORIZATION).is_none());

        request.set_bearer(Some("abc")).unwrap();
        assert_eq!(request.bearer(), Some("abc"));
        assert!(request.headers[AUTHORIZATION].is_sensitive());
        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_set_bearer_rejects_control_characters() {
        let mut request = ApiRequest::get("/courses/");
        assert!(request.set_bearer(Some("abc\r\nX-Injected: 1")).is_err());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_any_method_is_expressible() {
        let request = ApiRequest::new(Method::OPTIONS, "/attendance/courses/");
        assert_eq!(request.method, Method::OPTIONS);
        assert_eq!(ApiRequest::new(Method::HEAD, "/").method.as_str(), "HEAD");
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = ApiRequest::post("/excuses/")
            .json(&serde_json::json!({ "reason": "sick" }))
            .unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.body.as_deref(), Some(&br#"{"reason":"sick"}"#[..]));
    }

    #[test]
    fn test_unauthenticated_response_shape() {
        let response = ApiResponse::unauthenticated("log in again");
        assert!(response.is_unauthorized());
        assert!(!response.is_success());
        assert_eq!(response.headers[CONTENT_TYPE], "application/json");

        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"], "log in again");
    }
}
