use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Retryable error ({status})")]
    RetryableStatus { status: u16 },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid payload from {source_name}: {message}")]
    InvalidPayload { source_name: String, message: String },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CleanupError {
    /// Whether the retry fetcher should try the source again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CleanupError::RetryableStatus { .. } | CleanupError::Network(_))
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 503 => CleanupError::RetryableStatus { status },
            _ => CleanupError::Status { status },
        }
    }

    /// Fixed-cardinality label for retry metrics. Error messages are never
    /// used as labels since transport errors embed URLs and OS detail.
    pub fn retry_reason(&self) -> &'static str {
        match self {
            CleanupError::RetryableStatus { status: 401 } => "status_401",
            CleanupError::RetryableStatus { status: 503 } => "status_503",
            CleanupError::RetryableStatus { .. } => "status_other",
            CleanupError::Network(_) => "network",
            _ => "permanent",
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(CleanupError::from_status(503).is_retryable());
        assert!(CleanupError::from_status(401).is_retryable());
        assert!(!CleanupError::from_status(404).is_retryable());
        assert!(!CleanupError::from_status(500).is_retryable());
        assert!(CleanupError::Network("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_messages_match_route_output() {
        assert_eq!(CleanupError::from_status(503).to_string(), "Retryable error (503)");
        assert_eq!(CleanupError::from_status(404).to_string(), "HTTP 404");
    }

    #[test]
    fn test_retry_reason_is_bounded() {
        assert_eq!(CleanupError::from_status(503).retry_reason(), "status_503");
        assert_eq!(CleanupError::from_status(401).retry_reason(), "status_401");
        assert_eq!(CleanupError::from_status(404).retry_reason(), "permanent");

        let first = CleanupError::Network("error sending request for url (http://a.test/x)".into());
        let second = CleanupError::Network("connection reset by peer".into());
        assert_eq!(first.retry_reason(), "network");
        assert_eq!(first.retry_reason(), second.retry_reason());
    }
}
