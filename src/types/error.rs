use thiserror::Error;

/// soberstats error types
#[derive(Error, Debug)]
pub enum SoberError {
    /// Failed to parse stored or received data
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Local or remote store operation failed
    #[error("store error: {0}")]
    Store(String),

    /// Remote store rejected the request (security rules)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Network/HTTP failure talking to an external service
    #[error("network error: {0}")]
    Network(String),

    /// Sign-in or token refresh failed
    #[error("auth error: {0}")]
    Auth(String),

    /// Missing or invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// Invalid user input (dates, doses, mood range)
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for SoberError {
    fn from(e: reqwest::Error) -> Self {
        SoberError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for SoberError {
    fn from(e: serde_json::Error) -> Self {
        SoberError::Parse(e.to_string())
    }
}

/// Result type alias for soberstats
pub type Result<T> = std::result::Result<T, SoberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SoberError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "parse error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SoberError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_permission_denied_display() {
        let err = SoberError::PermissionDenied("users/abc/logs".into());
        assert_eq!(err.to_string(), "permission denied: users/abc/logs");
    }
}
