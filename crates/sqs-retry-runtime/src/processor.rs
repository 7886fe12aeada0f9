//! # Message Processor
//!
//! Owns the two entry points of the template:
//!
//! - [`MessageProcessor::process`] handles one decoded event delivered by the
//!   primary trigger.
//! - [`MessageProcessor::retry_batch`] drains the retry queue: it polls for a
//!   batch, runs every message through the same pipeline in receipt order,
//!   acknowledges the successful ones, and polls again until a receive
//!   returns nothing.
//!
//! Failures are never caught here. A malformed body, a handler error or a
//! queue transport error ends the drain invocation; messages that were not
//! acknowledged yet stay on the queue and are redelivered once their lease
//! expires. There is no limit on the number of cycles other than the empty
//! receive, so the host's own execution timeout bounds a drain invocation.

use crate::client::QueueClient;
use crate::config::{AcknowledgementMode, RetryConfig};
use crate::error::{ProcessingError, QueueError};
use crate::format::{JsonFormat, MessageFormat};
use crate::handler::{EventHandler, InvocationContext, PayloadExtractor};
use crate::message::{DeleteEntry, QueueMessage};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;

/// Summary of one drain invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DrainReport {
    /// Receive calls issued, including the final empty one
    pub receive_calls: usize,
    /// Messages whose handler completed
    pub messages_processed: usize,
    /// Messages the queue confirmed as deleted
    pub messages_deleted: usize,
    /// Batch delete entries the queue refused
    pub delete_failures: usize,
}

/// Generic message processor.
///
/// - `E`: outer event type decoded from the trigger or from a queue body
/// - `X`: payload extractor for `E`
/// - `H`: handler for the extracted payload
/// - `F`: wire format of queue message bodies
pub struct MessageProcessor<E, X, H, F = JsonFormat> {
    queue: Arc<dyn QueueClient>,
    config: RetryConfig,
    extractor: X,
    handler: H,
    format: F,
    _event: PhantomData<fn() -> E>,
}

impl<E, X, H> MessageProcessor<E, X, H, JsonFormat>
where
    E: DeserializeOwned + Send,
    X: PayloadExtractor<E>,
    X::Payload: 'static,
    H: EventHandler<X::Payload>,
{
    /// Create a processor with JSON message bodies
    pub fn new(queue: Arc<dyn QueueClient>, config: RetryConfig, extractor: X, handler: H) -> Self {
        Self::with_format(queue, config, extractor, handler, JsonFormat)
    }
}

impl<E, X, H, F> MessageProcessor<E, X, H, F>
where
    E: DeserializeOwned + Send,
    X: PayloadExtractor<E>,
    X::Payload: 'static,
    H: EventHandler<X::Payload>,
    F: MessageFormat,
{
    /// Create a processor with an explicit message format
    pub fn with_format(
        queue: Arc<dyn QueueClient>,
        config: RetryConfig,
        extractor: X,
        handler: H,
        format: F,
    ) -> Self {
        Self {
            queue,
            config,
            extractor,
            handler,
            format,
            _event: PhantomData,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Process one event delivered by the primary trigger
    #[instrument(skip(self, event, context), fields(request_id = %context.request_id))]
    pub async fn process(
        &self,
        event: E,
        context: &InvocationContext,
    ) -> Result<(), ProcessingError> {
        info!("Processing started");

        let payload = self.extractor.extract(event);
        self.handler
            .handle_event(payload, context)
            .await
            .map_err(ProcessingError::Handler)?;

        info!("Processing complete.");
        Ok(())
    }

    /// Drain the retry queue until a receive returns no messages
    #[instrument(
        skip(self, context),
        fields(
            request_id = %context.request_id,
            provider = self.queue.provider_name(),
            queue_url = %self.config.retry_queue_url,
            ack_mode = %self.config.ack_mode,
        )
    )]
    pub async fn retry_batch(
        &self,
        context: &InvocationContext,
    ) -> Result<DrainReport, ProcessingError> {
        let mut report = DrainReport::default();

        loop {
            // Polling
            let batch = self
                .queue
                .receive_messages(
                    &self.config.retry_queue_url,
                    self.config.max_messages,
                    self.config.wait_time(),
                )
                .await?;
            report.receive_calls += 1;

            if batch.is_empty() {
                info!(
                    receive_calls = report.receive_calls,
                    processed = report.messages_processed,
                    deleted = report.messages_deleted,
                    delete_failures = report.delete_failures,
                    "Retry queue drained"
                );
                return Ok(report);
            }

            // Draining
            debug!(batch_size = batch.len(), "Draining retry batch");
            self.drain_batch(batch, context, &mut report).await?;
        }
    }

    /// Process one received batch in order and acknowledge the successes
    async fn drain_batch(
        &self,
        batch: Vec<QueueMessage>,
        context: &InvocationContext,
        report: &mut DrainReport,
    ) -> Result<(), ProcessingError> {
        let mut pending = Vec::with_capacity(batch.len());

        for (index, message) in batch.into_iter().enumerate() {
            if let Err(error) = self.process_message(&message, context).await {
                warn!(
                    message_id = %message.message_id,
                    error_kind = error.kind(),
                    error = %error,
                    "Retry processing failed; leaving remaining messages on the queue"
                );
                self.flush_after_failure(&pending, report).await;
                return Err(error);
            }
            report.messages_processed += 1;

            match self.config.ack_mode {
                AcknowledgementMode::Individual => {
                    self.queue
                        .delete_message(&self.config.retry_queue_url, &message.receipt_handle)
                        .await?;
                    report.messages_deleted += 1;
                }
                AcknowledgementMode::Batch => {
                    pending.push(DeleteEntry::for_position(index, message.receipt_handle));
                }
            }
        }

        self.delete_pending(&pending, report).await?;
        Ok(())
    }

    /// Decode one queue message and run it through the pipeline
    async fn process_message(
        &self,
        message: &QueueMessage,
        context: &InvocationContext,
    ) -> Result<(), ProcessingError> {
        debug!(message_id = %message.message_id, body = %message.body, "Retrying message");

        let event: E =
            self.format
                .decode(&message.body)
                .map_err(|source| ProcessingError::Deserialization {
                    message_id: message.message_id.clone(),
                    source,
                })?;

        self.process(event, context).await
    }

    /// Acknowledge the collected entries with one batch delete
    async fn delete_pending(
        &self,
        pending: &[DeleteEntry],
        report: &mut DrainReport,
    ) -> Result<(), QueueError> {
        if pending.is_empty() {
            return Ok(());
        }

        let outcome = self
            .queue
            .delete_message_batch(&self.config.retry_queue_url, pending)
            .await?;

        report.messages_deleted += outcome.successful.len();
        report.delete_failures += outcome.failed.len();

        for failure in &outcome.failed {
            warn!(
                entry_id = %failure.id,
                code = %failure.code,
                message = failure.message.as_deref().unwrap_or_default(),
                sender_fault = failure.sender_fault,
                "Batch delete entry failed; message will be redelivered"
            );
        }

        Ok(())
    }

    /// Acknowledge the processed prefix of a batch before an error propagates
    async fn flush_after_failure(&self, pending: &[DeleteEntry], report: &mut DrainReport) {
        if let Err(flush_error) = self.delete_pending(pending, report).await {
            warn!(
                entries = pending.len(),
                error = %flush_error,
                "Failed to acknowledge processed messages after a processing failure"
            );
        }
    }
}
