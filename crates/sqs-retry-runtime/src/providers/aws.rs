//! AWS SQS queue client built on the AWS SDK.
//!
//! The SDK client is created once per process from the configured region and
//! reused for every invocation. Credentials come from the standard AWS
//! provider chain (environment, profile, or the execution role of the host).
//!
//! ## Error mapping
//!
//! SDK failures are first classified into [`AwsError`] and then mapped onto
//! the provider-neutral [`QueueError`]:
//!
//! - dispatch, timeout and response failures → `ConnectionFailed`
//! - `AWS.SimpleQueueService.NonExistentQueue` → `QueueNotFound`
//! - `ReceiptHandleIsInvalid` → `MessageNotFound`
//! - credential and permission codes → `AuthenticationFailed`
//! - everything else → `ProviderError`

use crate::client::QueueClient;
use crate::error::{QueueError, ValidationError};
use crate::message::{
    BatchDeleteFailure, BatchDeleteOutcome, DeleteEntry, QueueMessage, QueueUrl, ReceiptHandle,
    MAX_BATCH_SIZE,
};
use async_trait::async_trait;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::DeleteMessageBatchRequestEntry;
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
#[path = "aws_tests.rs"]
mod tests;

const PROVIDER_NAME: &str = "AwsSqs";

/// Longest long-poll wait SQS accepts
const MAX_WAIT_TIME_SECONDS: u64 = 20;

// ============================================================================
// Error Types
// ============================================================================

/// AWS SQS specific errors
#[derive(Debug, thiserror::Error)]
pub enum AwsError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("SQS service error: {code} - {message}")]
    ServiceError { code: String, message: String },

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Invalid receipt handle: {0}")]
    InvalidReceipt(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AwsError {
    /// Check if error is transient and a later invocation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Authentication(_) => false,
            Self::NetworkError(_) => true,
            Self::ServiceError { .. } => true, // Throttling and internal errors
            Self::QueueNotFound(_) => false,
            Self::InvalidReceipt(_) => false,
            Self::InvalidRequest(_) => false,
        }
    }

    /// Map AWS error to QueueError
    pub fn to_queue_error(self) -> QueueError {
        match self {
            Self::Authentication(message) => QueueError::AuthenticationFailed { message },
            Self::NetworkError(message) => QueueError::ConnectionFailed { message },
            Self::ServiceError { code, message } => QueueError::ProviderError {
                provider: PROVIDER_NAME.to_string(),
                code,
                message,
            },
            Self::QueueNotFound(queue_url) => QueueError::QueueNotFound { queue_url },
            Self::InvalidReceipt(receipt) => QueueError::MessageNotFound { receipt },
            Self::InvalidRequest(message) => QueueError::ProviderError {
                provider: PROVIDER_NAME.to_string(),
                code: "InvalidRequest".to_string(),
                message,
            },
        }
    }
}

/// Classify an SQS error code returned by the service
fn classify_service_error(
    code: Option<&str>,
    message: Option<&str>,
    queue_url: &QueueUrl,
    receipt: Option<&ReceiptHandle>,
) -> AwsError {
    let message = message.unwrap_or("no error message").to_string();

    match code {
        Some("AWS.SimpleQueueService.NonExistentQueue") | Some("QueueDoesNotExist") => {
            AwsError::QueueNotFound(queue_url.to_string())
        }
        Some("ReceiptHandleIsInvalid") => AwsError::InvalidReceipt(
            receipt
                .map(ReceiptHandle::to_string)
                .unwrap_or_else(|| message.clone()),
        ),
        Some("InvalidClientTokenId")
        | Some("UnrecognizedClientException")
        | Some("SignatureDoesNotMatch")
        | Some("ExpiredToken")
        | Some("AccessDenied")
        | Some("AccessDeniedException") => AwsError::Authentication(message),
        Some(code) => AwsError::ServiceError {
            code: code.to_string(),
            message,
        },
        None => AwsError::ServiceError {
            code: "Unknown".to_string(),
            message,
        },
    }
}

/// Classify any SDK failure
fn classify_sdk_error<E, R>(
    error: SdkError<E, R>,
    queue_url: &QueueUrl,
    receipt: Option<&ReceiptHandle>,
) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    match &error {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
            AwsError::NetworkError(DisplayErrorContext(&error).to_string())
        }
        SdkError::ConstructionFailure(_) => {
            AwsError::InvalidRequest(DisplayErrorContext(&error).to_string())
        }
        _ => classify_service_error(error.code(), error.message(), queue_url, receipt),
    }
}

// ============================================================================
// SqsQueueClient
// ============================================================================

/// Queue client backed by the AWS SDK for SQS
#[derive(Clone)]
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
}

impl SqsQueueClient {
    /// Wrap an existing SDK client
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }

    /// Build a client for `region` using the default credential chain
    pub async fn from_region(region: &str) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::new(aws_sdk_sqs::Client::new(&sdk_config))
    }
}

impl fmt::Debug for SqsQueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsQueueClient")
            .field("region", &self.client.config().region())
            .finish()
    }
}

/// Convert an SDK message into the runtime representation
fn convert_message(message: &aws_sdk_sqs::types::Message) -> Result<QueueMessage, QueueError> {
    let receipt = message
        .receipt_handle()
        .ok_or_else(|| QueueError::ProviderError {
            provider: PROVIDER_NAME.to_string(),
            code: "MissingReceiptHandle".to_string(),
            message: format!(
                "message {} was returned without a receipt handle",
                message.message_id().unwrap_or("<unknown>")
            ),
        })?;

    Ok(QueueMessage::new(
        message.message_id().unwrap_or_default().to_string(),
        message.body().unwrap_or_default().to_string(),
        ReceiptHandle::new(receipt.to_string())?,
    ))
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive_messages(
        &self,
        queue_url: &QueueUrl,
        max_messages: u32,
        wait_time: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        if max_messages as usize > MAX_BATCH_SIZE {
            return Err(QueueError::BatchTooLarge {
                size: max_messages as usize,
                max_size: MAX_BATCH_SIZE,
            });
        }

        let wait_time_seconds = wait_time.as_secs().min(MAX_WAIT_TIME_SECONDS) as i32;

        let output = self
            .client
            .receive_message()
            .queue_url(queue_url.as_str())
            .max_number_of_messages(max_messages as i32)
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, queue_url, None).to_queue_error())?;

        let messages = output
            .messages()
            .iter()
            .map(convert_message)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            queue_url = %queue_url,
            received = messages.len(),
            "Received messages from SQS"
        );

        Ok(messages)
    }

    async fn delete_message(
        &self,
        queue_url: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue_url.as_str())
            .receipt_handle(receipt.as_str())
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, queue_url, Some(receipt)).to_queue_error())?;

        Ok(())
    }

    async fn delete_message_batch(
        &self,
        queue_url: &QueueUrl,
        entries: &[DeleteEntry],
    ) -> Result<BatchDeleteOutcome, QueueError> {
        if entries.is_empty() {
            return Ok(BatchDeleteOutcome::default());
        }

        if entries.len() > MAX_BATCH_SIZE {
            return Err(QueueError::BatchTooLarge {
                size: entries.len(),
                max_size: MAX_BATCH_SIZE,
            });
        }

        let request_entries = entries
            .iter()
            .map(|entry| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id.as_str())
                    .receipt_handle(entry.receipt_handle.as_str())
                    .build()
                    .map_err(|e| {
                        QueueError::ValidationError(ValidationError::InvalidFormat {
                            field: "delete_entry".to_string(),
                            message: e.to_string(),
                        })
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .delete_message_batch()
            .queue_url(queue_url.as_str())
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, queue_url, None).to_queue_error())?;

        Ok(BatchDeleteOutcome {
            successful: output
                .successful()
                .iter()
                .map(|entry| entry.id().to_string())
                .collect(),
            failed: output
                .failed()
                .iter()
                .map(|entry| BatchDeleteFailure {
                    id: entry.id().to_string(),
                    code: entry.code().to_string(),
                    message: entry.message().map(str::to_string),
                    sender_fault: entry.sender_fault(),
                })
                .collect(),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
