use thiserror::Error;

use crate::messages;
use crate::models::ApiErrorBody;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Failed to persist session: {0}")]
    Storage(String),
}

/// Coarse classification used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never reached the server or never came back.
    Transport,
    /// Credentials were rejected.
    Authentication,
    /// The session token was rejected.
    Authorization,
    /// Anything else the server or the client reported.
    Server,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => match serde_json::from_str::<ApiErrorBody>(body) {
                Ok(parsed) => ApiError::BadRequest(parsed.error),
                Err(_) => ApiError::BadRequest(truncated),
            },
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NetworkError(_) => ErrorKind::Transport,
            ApiError::BadRequest(_)
            | ApiError::AuthenticationFailed
            | ApiError::InvalidCredentials => ErrorKind::Authentication,
            ApiError::Unauthorized => ErrorKind::Authorization,
            ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::RateLimited
            | ApiError::ServerError(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Storage(_) => ErrorKind::Server,
        }
    }

    /// True when the server never got to judge the request: transport
    /// failures, 5xx, 403 and 429.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ApiError::NetworkError(_)
                | ApiError::ServerError(_)
                | ApiError::AccessDenied(_)
                | ApiError::RateLimited
        )
    }

    /// Message to show on the login screen for this failure.
    pub fn login_message(&self) -> String {
        match self {
            ApiError::NetworkError(_) => messages::NETWORK_ERROR.to_string(),
            ApiError::BadRequest(msg) if !msg.trim().is_empty() => msg.clone(),
            ApiError::InvalidCredentials => self.to_string(),
            ApiError::Unauthorized | ApiError::AuthenticationFailed => {
                messages::LOGIN_FAILED.to_string()
            }
            _ => messages::LOGIN_FAILED_GENERIC.to_string(),
        }
    }
}
