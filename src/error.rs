//! Error types for connector management operations.

use thiserror::Error;

/// Result type for connector management operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Error types for connector management operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Retryable errors - transient failures that should be retried
    ///
    /// Examples: connection refused, request timeouts, 5xx from the Connect worker
    #[error("Retryable error: {message}")]
    Retryable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Fatal errors - permanent failures that require a configuration change
    ///
    /// Examples: unknown connector plugin, rejected request body, bad credentials
    #[error("Fatal error: {message}")]
    Fatal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error - detected at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Topic discovery failed (broker unreachable, metadata request failed)
    #[error("Topic discovery failed: {0}")]
    Discovery(String),

    /// The validation endpoint answered with something that is not a validation result
    ///
    /// The raw body is kept so it can be shown to the user as-is.
    #[error("Unexpected validation response: {raw}")]
    InvalidValidationResponse { raw: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectorError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::Retryable { .. })
    }

    /// Check if this error is fatal
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConnectorError::Fatal { .. })
    }

    /// Create a retryable error from a message
    pub fn retryable(message: impl Into<String>) -> Self {
        ConnectorError::Retryable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a retryable error with source
    pub fn retryable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Retryable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a fatal error from a message
    pub fn fatal(message: impl Into<String>) -> Self {
        ConnectorError::Fatal {
            message: message.into(),
            source: None,
        }
    }

    /// Create a fatal error with source
    pub fn fatal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Fatal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ConnectorError::Configuration(message.into())
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        ConnectorError::Discovery(message.into())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}

// Transport-level failures are worth another attempt; a request we could not
// even build or a body we could not decode is not.
impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ConnectorError::retryable_with_source("Connect request failed", err)
        } else {
            ConnectorError::fatal_with_source("Connect request failed", err)
        }
    }
}
