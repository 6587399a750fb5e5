//! Errors raised by the table layer.
//!
//! - [`ClientError`] is what a [`Backend`] call can fail with.
//! - [`TableError`] covers misconfigured tables and local state I/O.
//!
//!  [`Backend`]: crate::Backend
use api_types::error::ApiErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {}", .0.summary().unwrap_or("no details"))]
    Conflict(ApiErrorBody),
    #[error("validation failed: {}", .0.summary().unwrap_or("see field errors"))]
    Validation(ApiErrorBody),
    #[error("server error {status}: {}", .body.summary().unwrap_or("no details"))]
    Server { status: u16, body: ApiErrorBody },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Maps a non-2xx status and its decoded body the same way for every call.
    pub fn from_status(status: u16, body: ApiErrorBody) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict(body),
            422 => Self::Validation(body),
            _ => Self::Server { status, body },
        }
    }

    pub fn body(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::Conflict(body) | Self::Validation(body) | Self::Server { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Message suitable for a notification: the backend's own reason when it
    /// sent one, a generic one otherwise.
    pub fn user_message(&self) -> String {
        if let Some(summary) = self.body().and_then(ApiErrorBody::summary) {
            return summary.to_string();
        }
        match self {
            Self::Unauthorized | Self::Forbidden => "Not authorized.".to_string(),
            Self::NotFound => "The record no longer exists.".to_string(),
            Self::Conflict(_) => "The record was changed by someone else.".to_string(),
            Self::Validation(_) => "Some fields are invalid.".to_string(),
            Self::Server { .. } => "The server could not complete the request.".to_string(),
            Self::Transport(_) => "Server unreachable.".to_string(),
            Self::InvalidUrl(url) => format!("Invalid address: {url}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column \"{0}\" is sortable but has no resolvable sort key")]
    UnresolvedSortKey(String),
    #[error("page size must be greater than zero")]
    ZeroPageSize,
    #[error("invalid fetch target \"{target}\": {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
