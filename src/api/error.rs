//! Error type shared by every REST call and by the session store.

use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Non-success status with the server's message, if it sent one.
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection refused, DNS, timeout, TLS.
    #[error("network error: {0}")]
    Network(String),

    /// Body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Rejected on the client before any request was made.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Refresh token missing or rejected; local session has been torn down.
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("request cancelled")]
    Cancelled,

    #[error("client storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. } | ApiError::SessionExpired)
    }

    /// Builds an `Http` error from a status and a raw body, pulling the
    /// message out of the usual DRF shapes (`detail`, `error`, `message`,
    /// or a field-error map).
    pub fn from_response(status: u16, body: &str) -> Self {
        ApiError::Http {
            status,
            message: server_message(body).unwrap_or_else(|| default_reason(status)),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{err:#}"))
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["detail", "error", "message"] {
        if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }

    // Field errors: {"username": ["A user with that username already exists."]}
    let mut parts = Vec::new();
    for (field, errors) in object {
        let joined = match errors {
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            serde_json::Value::String(text) => text.clone(),
            _ => continue,
        };
        if !joined.is_empty() {
            parts.push(format!("{field}: {joined}"));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn default_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}
