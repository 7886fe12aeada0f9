//! # SQS Retry Runtime
//!
//! Message-processing template for serverless functions fed by a primary
//! event trigger and backed by an SQS retry queue.
//!
//! This library provides:
//! - A per-event pipeline: extract the payload, run the handler, log the outcome
//! - A drain loop that polls the retry queue in batches, reprocesses every
//!   message in order and acknowledges the successful ones
//! - Individual or batch acknowledgement of processed messages
//! - AWS SQS and in-memory queue backends behind one trait
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for queue operations and processing
//! - [`message`] - Queue URLs, messages, receipt handles and delete entries
//! - [`config`] - Start-up configuration from the environment
//! - [`client`] - The queue client trait
//! - [`providers`] - AWS SQS and in-memory queue backends
//! - [`format`] - Message body formats
//! - [`handler`] - Payload extraction and business handler extension points
//! - [`processor`] - Trigger pipeline and retry drain loop
//!
//! ## Example
//!
//! ```
//! use sqs_retry_runtime::{
//!     handler_fn, BoxError, InMemoryQueue, InvocationContext, MessageProcessor, QueueUrl,
//!     RetryConfig,
//! };
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let url: QueueUrl = "https://sqs.eu-west-1.amazonaws.com/123456789012/retry"
//!     .parse()
//!     .unwrap();
//! let queue = InMemoryQueue::new();
//! queue.send_message(&url, r#"{"id":1}"#);
//!
//! let processor = MessageProcessor::<serde_json::Value, _, _>::new(
//!     Arc::new(queue.clone()),
//!     RetryConfig::new("eu-west-1", url.clone()),
//!     |event: serde_json::Value| event["id"].as_u64(),
//!     handler_fn(|id: Option<u64>, _context: InvocationContext| async move {
//!         assert_eq!(id, Some(1));
//!         Ok::<(), BoxError>(())
//!     }),
//! );
//!
//! let report = processor
//!     .retry_batch(&InvocationContext::new("req-1"))
//!     .await
//!     .unwrap();
//! assert_eq!(report.messages_deleted, 1);
//! assert_eq!(queue.visible_count(&url), 0);
//! # });
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod message;
pub mod processor;
pub mod providers;

pub use client::QueueClient;
pub use config::{AcknowledgementMode, RetryConfig};
pub use error::{
    BoxError, ConfigurationError, ProcessingError, QueueError, SerializationError,
    ValidationError,
};
pub use format::{JsonFormat, MessageFormat};
pub use handler::{handler_fn, EventHandler, HandlerFn, InvocationContext, PayloadExtractor};
pub use message::{
    BatchDeleteFailure, BatchDeleteOutcome, DeleteEntry, QueueMessage, QueueUrl, ReceiptHandle,
    MAX_BATCH_SIZE,
};
pub use processor::{DrainReport, MessageProcessor};
pub use providers::{InMemoryQueue, SqsQueueClient};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
