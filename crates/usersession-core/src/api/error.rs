use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the authentication call that carry no `{"code": ...}` envelope.
///
/// A rejection the service reports in its envelope is a payload, not an error.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Could not reach authentication service: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Credentials refused ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("No authentication endpoint at the configured URL ({status}); check api_base_url and auth_path")]
    EndpointMissing { status: StatusCode },

    #[error("Authentication service unavailable ({status}): {body}")]
    Unavailable { status: StatusCode, body: String },

    #[error("Unexpected status {status} from authentication service: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Authentication response is not a valid envelope ({reason}): {body}")]
    MalformedPayload { reason: String, body: String },
}

/// Bytes of a response body kept in error messages
const BODY_PREVIEW_BYTES: usize = 256;

/// Shorten `body` for display, cutting on a char boundary.
pub(crate) fn preview(body: &str) -> String {
    if body.len() <= BODY_PREVIEW_BYTES {
        return body.to_string();
    }
    let mut end = BODY_PREVIEW_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}

impl ApiError {
    /// Classify an error status whose body is not an auth envelope
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = preview(body);
        match status.as_u16() {
            401 | 403 => ApiError::Rejected { status, body },
            404 | 405 => ApiError::EndpointMissing { status },
            429 | 500..=599 => ApiError::Unavailable { status, body },
            _ => ApiError::UnexpectedStatus { status, body },
        }
    }

    pub fn malformed(reason: impl ToString, body: &str) -> Self {
        ApiError::MalformedPayload {
            reason: reason.to_string(),
            body: preview(body),
        }
    }

    /// Worth trying again later without changing credentials or config
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Unreachable(_) | ApiError::Unavailable { .. })
    }
}
