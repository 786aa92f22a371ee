//! Stream error types and error categorization
//!
//! Errors are categorized to determine retry behavior:
//! - **Transient**: temporary failures, retried with exponential backoff
//! - **Permanent**: unrecoverable errors, moved to the DLQ immediately

use thiserror::Error;

pub type StreamResult<T> = Result<T, StreamError>;

/// Category of error for determining retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Temporary failure, retry with exponential backoff (1s doubling, capped at 30s)
    Transient,
    /// Unrecoverable error, move to DLQ immediately
    Permanent,
}

impl ErrorCategory {
    /// Base delay in milliseconds
    pub fn base_delay_ms(&self) -> u64 {
        match self {
            ErrorCategory::Transient => 1000,
            ErrorCategory::Permanent => 0,
        }
    }

    /// Maximum delay in milliseconds
    pub fn max_delay_ms(&self) -> u64 {
        match self {
            ErrorCategory::Transient => 30_000,
            ErrorCategory::Permanent => 0,
        }
    }

    /// Exponential backoff delay for the given retry count
    pub fn backoff_delay_ms(&self, retry_count: u32) -> u64 {
        if *self == ErrorCategory::Permanent {
            return 0;
        }

        let delay = self
            .base_delay_ms()
            .saturating_mul(2u64.saturating_pow(retry_count));
        delay.min(self.max_delay_ms())
    }
}

/// Stream processing errors
#[derive(Error, Debug)]
pub enum StreamError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Job processing failed
    #[error("Processing error: {message}")]
    Processing {
        message: String,
        category: ErrorCategory,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Shutdown requested
    #[error("Shutdown requested")]
    Shutdown,
}

impl StreamError {
    /// Create a transient processing error
    pub fn transient(message: impl Into<String>) -> Self {
        StreamError::Processing {
            message: message.into(),
            category: ErrorCategory::Transient,
        }
    }

    /// Create a permanent processing error
    pub fn permanent(message: impl Into<String>) -> Self {
        StreamError::Processing {
            message: message.into(),
            category: ErrorCategory::Permanent,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Redis(_) => ErrorCategory::Transient,
            StreamError::Processing { category, .. } => *category,
            StreamError::Serialization(_)
            | StreamError::Config(_)
            | StreamError::Internal(_)
            | StreamError::Shutdown => ErrorCategory::Permanent,
        }
    }

    /// Whether a job failing with this error may be retried again.
    pub fn should_retry(&self, retry_count: u32, max_retries: u32) -> bool {
        self.category() == ErrorCategory::Transient && retry_count < max_retries
    }

    pub fn backoff_delay_ms(&self, retry_count: u32) -> u64 {
        self.category().backoff_delay_ms(retry_count)
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

impl From<core_config::ConfigError> for StreamError {
    fn from(err: core_config::ConfigError) -> Self {
        StreamError::Config(err.to_string())
    }
}
