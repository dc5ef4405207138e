//! Authentication service client.
//!
//! This module provides the `AuthService` seam used by the session store
//! and `ApiClient`, its HTTP implementation. The service validates the
//! caller's ambient credentials (the stored bearer token, when present)
//! and answers with an `AuthResponse` carrying a numeric `code`.

pub mod client;
pub mod error;

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use client::ApiClient;
pub use error::ApiError;

/// Status code the authentication service uses for success
pub const AUTH_SUCCESS_CODE: i64 = 200;

/// Payload returned by the authentication service.
///
/// Anything beyond `code`, `token`, and `username` is kept in `extra`
/// so it can be merged into the session record unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthResponse {
    /// Response with just a status code
    pub fn with_code(code: i64) -> Self {
        Self {
            code,
            token: None,
            username: None,
            extra: Map::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == AUTH_SUCCESS_CODE
    }
}

/// A single call to the authentication endpoint.
///
/// Transport failures are returned as errors; a non-success `code` is not
/// an error at this level.
pub trait AuthService {
    fn auth(&self) -> impl Future<Output = Result<AuthResponse>> + Send;
}
