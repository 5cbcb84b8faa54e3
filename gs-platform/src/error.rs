use thiserror::Error;

use crate::model::Snowflake;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs:.1}s")]
    RateLimited { retry_after_secs: f64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Snowflake },

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl PlatformError {
    pub fn not_found(kind: &'static str, id: Snowflake) -> Self {
        Self::NotFound { kind, id }
    }

    /// Whether the remote service refused the call because of missing access
    pub fn is_forbidden(&self) -> bool {
        matches!(self, PlatformError::Http { status: 403, .. })
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatformError::Decode(err.to_string())
        } else {
            PlatformError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Decode(err.to_string())
    }
}
