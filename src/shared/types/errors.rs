use std::time::Duration;

use thiserror::Error;

/// Failure of a single page fetch.
///
/// `Clone` so one result can be handed to every caller sharing an
/// in-flight request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Token missing, expired or rejected (401 / 403)
    #[error("Not authorized: {0}")]
    Auth(String),
}

impl FetchError {
    /// Whether this error is likely transient (network blip, timeout, 5xx)
    /// and the same request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Error)]
pub enum HubError {
    #[error("Hub connection failed: {0}")]
    Connect(String),

    #[error("Hub connection lost: {0}")]
    Disconnected(String),

    #[error("Malformed hub message: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hub(#[from] HubError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Transport("reset".into()).is_transient());
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_transient());
        assert!(FetchError::Status { status: 503, message: "busy".into() }.is_transient());
        assert!(!FetchError::Status { status: 404, message: "gone".into() }.is_transient());
        assert!(!FetchError::Decode("eof".into()).is_transient());
        assert!(!FetchError::InvalidRequest("page".into()).is_transient());
    }
}
