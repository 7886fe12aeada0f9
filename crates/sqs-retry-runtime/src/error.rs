//! Error types for queue operations and message processing.

use thiserror::Error;

/// Boxed error returned by user-supplied handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Transport-level error for all queue adapter operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not found: {queue_url}")]
    QueueNotFound { queue_url: String },

    #[error("Message not found or receipt expired: {receipt}")]
    MessageNotFound { receipt: String },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Batch size {size} exceeds maximum {max_size}")]
    BatchTooLarge { size: usize, max_size: usize },

    #[error("Provider error ({provider}): {code} - {message}")]
    ProviderError {
        provider: String,
        code: String,
        message: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient and a later invocation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueNotFound { .. } => false,
            Self::MessageNotFound { .. } => false,
            Self::ConnectionFailed { .. } => true,
            Self::AuthenticationFailed { .. } => false,
            Self::BatchTooLarge { .. } => false,
            Self::ProviderError { .. } => true, // Throttling and service faults end up here
            Self::ValidationError(_) => false,
        }
    }
}

/// Errors during message body serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read message stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        Self::Parsing {
            message: error.to_string(),
        }
    }
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

/// Failure of a trigger or drain invocation.
///
/// Every variant aborts the drain cycle it occurs in. Messages of the current
/// batch that were not yet acknowledged stay on the queue and become visible
/// again once their lease expires.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Queue operation failed: {0}")]
    Transport(#[from] QueueError),

    #[error("Failed to deserialize message {message_id}: {source}")]
    Deserialization {
        message_id: String,
        #[source]
        source: SerializationError,
    },

    #[error("Event handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl ProcessingError {
    /// Short stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Deserialization { .. } => "deserialization",
            Self::Handler(_) => "handler",
        }
    }

    /// Whether the error ends the drain cycle it occurred in
    pub fn is_fatal_for_batch(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Deserialization { .. } | Self::Handler(_) => true,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
