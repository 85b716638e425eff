//! Error types for vccli-core.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias using the vccli-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum Error {
    /// The session endpoint rejected the token (401). Triggers a new session.
    #[error("unauthorized")]
    NotAuthenticated,

    #[error("incorrect response, status {status}, body {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("can't decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("can't encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("deadline exceeded while authenticating")]
    Cancelled,

    #[error("can't get session info: {0}")]
    SessionInfo(#[source] Box<Error>),

    #[error("can't create session: {0}")]
    CreateSession(#[source] Box<Error>),

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    #[error("invalid configuration for {name}: {value:?}")]
    InvalidConfig { name: &'static str, value: String },
}

impl Error {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Error::UnexpectedStatus {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// True when this error, or the error it wraps, is the 401 sentinel.
    pub fn is_not_authenticated(&self) -> bool {
        match self {
            Error::NotAuthenticated => true,
            Error::SessionInfo(inner) | Error::CreateSession(inner) => inner.is_not_authenticated(),
            _ => false,
        }
    }

    /// True when the validate/create deadline elapsed.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::SessionInfo(inner) | Error::CreateSession(inner) => inner.is_cancelled(),
            _ => false,
        }
    }

    /// Status code carried by an unexpected response, looking through wrappers.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            Error::SessionInfo(inner) | Error::CreateSession(inner) => inner.status(),
            _ => None,
        }
    }

    pub(crate) fn session_info(self) -> Self {
        Error::SessionInfo(Box::new(self))
    }

    pub(crate) fn create_session(self) -> Self {
        Error::CreateSession(Box::new(self))
    }
}
