//! Client trait for queue operations used by the drain loop.

use crate::error::QueueError;
use crate::message::{BatchDeleteOutcome, DeleteEntry, QueueMessage, QueueUrl, ReceiptHandle};
use async_trait::async_trait;
use std::time::Duration;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Interface implemented by queue backends (AWS SQS, in-memory)
///
/// Implementations are stateless per call and are shared for the lifetime of
/// the host process.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receive up to `max_messages` messages, waiting at most `wait_time`
    /// for the first one to arrive.
    ///
    /// Fewer messages than requested is not an error. Requests above
    /// [`MAX_BATCH_SIZE`](crate::message::MAX_BATCH_SIZE) are rejected.
    async fn receive_messages(
        &self,
        queue_url: &QueueUrl,
        max_messages: u32,
        wait_time: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Delete a single delivery
    async fn delete_message(
        &self,
        queue_url: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError>;

    /// Delete several deliveries with one call.
    ///
    /// An `Err` means the call itself failed. Entries the service refused are
    /// listed in [`BatchDeleteOutcome::failed`].
    async fn delete_message_batch(
        &self,
        queue_url: &QueueUrl,
        entries: &[DeleteEntry],
    ) -> Result<BatchDeleteOutcome, QueueError>;

    /// Name used in logs
    fn provider_name(&self) -> &'static str;
}
