//! HTTP request builder and response parser for the driver API.
//!
//! # Design
//! `ApiClient` holds the base URL and the `SessionContext`. Each operation
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`, so the core stays free
//! of I/O. The combined methods (`request`, `login`, and the driver
//! operations in `drivers.rs`) run the round trip through a `Transport`.
//!
//! Any 401 observed by `parse_response` invalidates the session before the
//! error is returned. Login is the exception: it never carries a token, and
//! a 401 there only means the credentials were wrong.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{decode_error, ApiError};
use crate::http::{CacheMode, HttpMethod, HttpRequest, HttpResponse};
use crate::session::{Session, SessionContext};
use crate::transport::Transport;
use crate::types::{LoginRequest, LoginResponse};

pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionContext) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, config.session_context())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    /// Build a request for `path` on the API, with the bearer token attached
    /// when one is stored.
    pub fn build_request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        self.build_request_with_headers(method, path, Vec::new(), body)
    }

    /// Like `build_request`, starting from caller-supplied headers. A
    /// caller's `content-type` replaces the JSON default.
    pub fn build_request_with_headers(
        &self,
        method: HttpMethod,
        path: &str,
        mut headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> HttpRequest {
        let has_content_type = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if body.is_some() && !has_content_type {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.session.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
            cache: CacheMode::Default,
        }
    }

    /// Like `build_request`, serializing `body` as JSON.
    pub fn build_json<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.build_request(method, path, Some(body)))
    }

    /// Parse an authenticated response.
    ///
    /// 204 decodes `T` from JSON `null`, so it suits `()` and `Option<_>`.
    pub fn parse_response<T: DeserializeOwned>(&mut self, response: HttpResponse) -> Result<T, ApiError> {
        let result = decode_response(response);
        if let Err(err) = &result {
            if err.is_unauthorized() {
                self.session.invalidate();
            }
        }
        result
    }

    /// Build, execute and parse in one step.
    pub fn request<T: DeserializeOwned>(
        &mut self,
        transport: &mut dyn Transport,
        request: HttpRequest,
    ) -> Result<T, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = transport.execute(request)?;
        self.parse_response(response)
    }

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{LOGIN_PATH}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            cache: CacheMode::Default,
        })
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        decode_response(response)
    }

    /// Authenticate and, on success, start the session.
    pub fn login(&mut self, transport: &mut dyn Transport, input: &LoginRequest) -> Result<Session, ApiError> {
        let request = self.build_login(input)?;
        let response = self.parse_login(transport.execute(request)?)?;
        let session = Session {
            token: response.token,
            expires_at: response.expires_at,
            email: input.email.clone(),
        };
        self.session
            .begin(session.clone())
            .map_err(|e| ApiError::Session(e.to_string()))?;
        Ok(session)
    }

    pub fn logout(&mut self) {
        self.session.end();
    }
}

/// Map a response to `T` or to the typed error. Never touches the session.
pub fn decode_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(decode_error(response.status, &response.body));
    }
    if response.status == 204 {
        return serde_json::from_value(serde_json::Value::Null)
            .map_err(|e| ApiError::Deserialization(e.to_string()));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
