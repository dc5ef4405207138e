//! HTTP client for the authentication service.
//!
//! `ApiClient` issues the single authentication request and decodes the
//! `AuthResponse` envelope. Request timeouts are owned here; nothing is
//! retried.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

use super::{ApiError, AuthResponse, AuthService};

// ============================================================================
// Constants
// ============================================================================

/// Default path of the authentication endpoint, relative to the base URL
pub const DEFAULT_AUTH_PATH: &str = "/auth";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the authentication endpoint. Clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_path: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client with the default endpoint path and timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(
            base_url,
            DEFAULT_AUTH_PATH,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        base_url: impl Into<String>,
        auth_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_path: auth_path.into(),
            token: None,
        })
    }

    /// Set the bearer token sent with the authentication request
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Copy of this client that authenticates as `token`
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth_path: self.auth_path.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.auth_path.starts_with('/') {
            format!("{}{}", base, self.auth_path)
        } else {
            format!("{}/{}", base, self.auth_path)
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Stored token is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    /// Decode an authentication response body.
    ///
    /// Error statuses that still carry the JSON envelope are handed back as
    /// payloads so the caller sees the service's own `code`. Anything else
    /// is classified by HTTP status.
    fn decode(status: StatusCode, body: &str) -> Result<AuthResponse> {
        if status.is_success() {
            return serde_json::from_str(body).map_err(|e| ApiError::malformed(e, body).into());
        }

        match serde_json::from_str::<AuthResponse>(body) {
            Ok(payload) => {
                warn!(status = %status, code = payload.code, "Authentication request rejected");
                Ok(payload)
            }
            Err(_) => Err(ApiError::from_status(status, body).into()),
        }
    }

    /// Call the authentication endpoint once
    pub async fn auth(&self) -> Result<AuthResponse> {
        let url = self.auth_url();
        debug!(url = %url, has_token = self.token.is_some(), "Sending authentication request");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::Unreachable)
            .with_context(|| format!("Failed to send authentication request to {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read authentication response body")?;

        let payload = Self::decode(status, &body)?;
        debug!(status = %status, code = payload.code, "Authentication response received");
        Ok(payload)
    }
}

impl AuthService for ApiClient {
    async fn auth(&self) -> Result<AuthResponse> {
        ApiClient::auth(self).await
    }
}
