//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest number of messages a single receive or batch delete may carry
pub const MAX_BATCH_SIZE: usize = 10;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue endpoint URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueueUrl(String);

impl QueueUrl {
    /// Create new queue URL with validation
    pub fn new(url: String) -> Result<Self, ValidationError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "queue_url".to_string(),
            });
        }

        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(ValidationError::InvalidFormat {
                field: "queue_url".to_string(),
                message: "must be an http(s) endpoint".to_string(),
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "queue_url".to_string(),
                message: "must not contain whitespace".to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get queue URL as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueUrl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for QueueUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueueUrl> for String {
    fn from(url: QueueUrl) -> Self {
        url.0
    }
}

/// Opaque token for deleting one specific delivery of a message.
///
/// Only valid for the lease obtained by the receive call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    /// Create new receipt handle
    pub fn new(handle: String) -> Result<Self, ValidationError> {
        if handle.is_empty() {
            return Err(ValidationError::Required {
                field: "receipt_handle".to_string(),
            });
        }

        Ok(Self(handle))
    }

    /// Get handle string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// A message received from the queue together with its lease token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
    pub receipt_handle: ReceiptHandle,
}

impl QueueMessage {
    pub fn new(message_id: String, body: String, receipt_handle: ReceiptHandle) -> Self {
        Self {
            message_id,
            body,
            receipt_handle,
        }
    }
}

/// One entry of a batch delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    /// Batch-local identifier, unique within one request
    pub id: String,
    pub receipt_handle: ReceiptHandle,
}

impl DeleteEntry {
    /// Create an entry for the message at `index` within its received batch
    pub fn for_position(index: usize, receipt_handle: ReceiptHandle) -> Self {
        Self {
            id: index.to_string(),
            receipt_handle,
        }
    }
}

/// Per-entry failure reported by a batch delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeleteFailure {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    /// True when the service blames the request rather than itself
    pub sender_fault: bool,
}

/// Result of a batch delete call that reached the queue service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteOutcome {
    pub successful: Vec<String>,
    pub failed: Vec<BatchDeleteFailure>,
}

impl BatchDeleteOutcome {
    /// Check if every entry was deleted
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
