use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Backend unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("{detail}")]
    Backend { status: u16, detail: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    #[error("HTTP request failed: {reason}")]
    Transport { reason: String },

    #[error("IO error: {reason}")]
    Io { reason: String },

    #[error("Storage error: {reason}")]
    Storage { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl ApiError {
    /// Backend could not be reached at all, as opposed to answering with an error.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Unreachable {
                reason: err.to_string(),
            }
        } else {
            ApiError::Transport {
                reason: err.to_string(),
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io {
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
