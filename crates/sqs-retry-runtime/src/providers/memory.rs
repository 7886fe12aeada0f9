//! In-memory queue implementation for testing and local development.
//!
//! This module provides a queue that behaves like a standard SQS queue as far
//! as the drain loop can observe:
//! - Messages are handed out oldest first
//! - Every receive leases the returned messages under a fresh receipt handle
//! - Leased messages are invisible until deleted or until their lease expires
//! - Deleting with an unknown or stale receipt handle fails
//!
//! Lease expiry is driven explicitly through [`InMemoryQueue::expire_leases`]
//! instead of wall-clock timers so tests stay deterministic. The queue also
//! keeps a journal of every call it served and supports failure injection.

use crate::client::QueueClient;
use crate::error::{QueueError, ValidationError};
use crate::message::{
    BatchDeleteFailure, BatchDeleteOutcome, DeleteEntry, QueueMessage, QueueUrl, ReceiptHandle,
    MAX_BATCH_SIZE,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// A message stored in the queue
#[derive(Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: u32,
}

/// A message currently leased to a consumer
struct LeasedMessage {
    message: StoredMessage,
    receipt_handle: String,
}

/// Internal state for a single queue
#[derive(Default)]
struct StoredQueue {
    available: VecDeque<StoredMessage>,
    leased: Vec<LeasedMessage>,
}

#[derive(Default)]
struct QueueState {
    queues: HashMap<QueueUrl, StoredQueue>,
    journal: OperationJournal,
    receive_failures: VecDeque<QueueError>,
    delete_failures: VecDeque<QueueError>,
    rejected_bodies: HashSet<String>,
}

impl QueueState {
    fn queue_mut(&mut self, queue_url: &QueueUrl) -> &mut StoredQueue {
        self.queues.entry(queue_url.clone()).or_default()
    }

    /// Remove a leased message by receipt, returning its body
    fn take_leased(&mut self, queue_url: &QueueUrl, receipt: &str) -> Option<String> {
        let queue = self.queues.get_mut(queue_url)?;
        let position = queue
            .leased
            .iter()
            .position(|leased| leased.receipt_handle == receipt)?;
        Some(queue.leased.remove(position).message.body)
    }
}

// ============================================================================
// Operation Journal
// ============================================================================

/// A receive call served by the in-memory queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveCall {
    pub queue_url: QueueUrl,
    pub max_messages: u32,
    pub returned: usize,
}

/// Record of the calls served by an [`InMemoryQueue`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationJournal {
    /// Every receive call, including failed ones (`returned == 0`)
    pub receive_calls: Vec<ReceiveCall>,
    /// Number of single-message delete calls
    pub delete_calls: usize,
    /// Number of batch delete calls
    pub batch_delete_calls: usize,
    /// Bodies of deleted messages in deletion order
    pub deleted_bodies: Vec<String>,
}

impl OperationJournal {
    /// Total number of messages removed, regardless of delete style
    pub fn deletions(&self) -> usize {
        self.deleted_bodies.len()
    }
}

// ============================================================================
// InMemoryQueue
// ============================================================================

/// In-memory queue client.
///
/// Cloning yields another handle to the same storage.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    /// Create an empty in-memory queue service
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // A panicking test thread must not take every other assertion with it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a message and return its generated ID
    pub fn send_message(&self, queue_url: &QueueUrl, body: impl Into<String>) -> String {
        let message_id = uuid::Uuid::new_v4().to_string();
        let message = StoredMessage {
            message_id: message_id.clone(),
            body: body.into(),
            receive_count: 0,
        };
        self.state().queue_mut(queue_url).available.push_back(message);
        message_id
    }

    /// Enqueue several messages in order
    pub fn send_messages<I, S>(&self, queue_url: &QueueUrl, bodies: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        bodies
            .into_iter()
            .map(|body| self.send_message(queue_url, body))
            .collect()
    }

    /// Number of messages that a receive call could currently return
    pub fn visible_count(&self, queue_url: &QueueUrl) -> usize {
        self.state()
            .queues
            .get(queue_url)
            .map_or(0, |queue| queue.available.len())
    }

    /// Number of messages currently leased
    pub fn leased_count(&self, queue_url: &QueueUrl) -> usize {
        self.state()
            .queues
            .get(queue_url)
            .map_or(0, |queue| queue.leased.len())
    }

    /// Bodies of all messages still on the queue: leased first, then visible
    pub fn remaining_bodies(&self, queue_url: &QueueUrl) -> Vec<String> {
        let state = self.state();
        let Some(queue) = state.queues.get(queue_url) else {
            return Vec::new();
        };

        queue
            .leased
            .iter()
            .map(|leased| leased.message.body.clone())
            .chain(queue.available.iter().map(|message| message.body.clone()))
            .collect()
    }

    /// How many times the message with the given body has been received
    pub fn receive_count(&self, queue_url: &QueueUrl, body: &str) -> Option<u32> {
        let state = self.state();
        let queue = state.queues.get(queue_url)?;
        queue
            .leased
            .iter()
            .map(|leased| &leased.message)
            .chain(queue.available.iter())
            .find(|message| message.body == body)
            .map(|message| message.receive_count)
    }

    /// Expire every outstanding lease, making those messages visible again.
    ///
    /// Returned messages go back to the front of the queue in their original
    /// order. Their old receipt handles become invalid.
    pub fn expire_leases(&self, queue_url: &QueueUrl) -> usize {
        let mut state = self.state();
        let queue = state.queue_mut(queue_url);
        let expired: Vec<LeasedMessage> = queue.leased.drain(..).collect();
        let count = expired.len();
        for leased in expired.into_iter().rev() {
            queue.available.push_front(leased.message);
        }
        count
    }

    /// Snapshot of the calls served so far
    pub fn journal(&self) -> OperationJournal {
        self.state().journal.clone()
    }

    /// Make the next receive call fail with `error`
    pub fn fail_next_receive(&self, error: QueueError) {
        self.state().receive_failures.push_back(error);
    }

    /// Make the next single or batch delete call fail with `error`
    pub fn fail_next_delete(&self, error: QueueError) {
        self.state().delete_failures.push_back(error);
    }

    /// Report batch delete entries for messages with this body as failed
    pub fn reject_batch_delete_for(&self, body: impl Into<String>) {
        self.state().rejected_bodies.insert(body.into());
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn receive_messages(
        &self,
        queue_url: &QueueUrl,
        max_messages: u32,
        _wait_time: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let mut state = self.state();

        if let Some(error) = state.receive_failures.pop_front() {
            state.journal.receive_calls.push(ReceiveCall {
                queue_url: queue_url.clone(),
                max_messages,
                returned: 0,
            });
            return Err(error);
        }

        if max_messages == 0 {
            return Err(QueueError::ValidationError(ValidationError::OutOfRange {
                field: "max_messages".to_string(),
                message: format!("must be between 1 and {}", MAX_BATCH_SIZE),
            }));
        }

        if max_messages as usize > MAX_BATCH_SIZE {
            return Err(QueueError::BatchTooLarge {
                size: max_messages as usize,
                max_size: MAX_BATCH_SIZE,
            });
        }

        let queue = state.queue_mut(queue_url);
        let take = (max_messages as usize).min(queue.available.len());
        let leasing: Vec<StoredMessage> = queue.available.drain(..take).collect();
        let mut received = Vec::with_capacity(take);

        for mut message in leasing {
            message.receive_count += 1;
            let receipt_handle = uuid::Uuid::new_v4().to_string();
            received.push(QueueMessage::new(
                message.message_id.clone(),
                message.body.clone(),
                ReceiptHandle::new(receipt_handle.clone())?,
            ));
            queue.leased.push(LeasedMessage {
                message,
                receipt_handle,
            });
        }

        state.journal.receive_calls.push(ReceiveCall {
            queue_url: queue_url.clone(),
            max_messages,
            returned: received.len(),
        });

        Ok(received)
    }

    async fn delete_message(
        &self,
        queue_url: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let mut state = self.state();
        state.journal.delete_calls += 1;

        if let Some(error) = state.delete_failures.pop_front() {
            return Err(error);
        }

        let body = state
            .take_leased(queue_url, receipt.as_str())
            .ok_or_else(|| QueueError::MessageNotFound {
                receipt: receipt.to_string(),
            })?;
        state.journal.deleted_bodies.push(body);
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

        let mut state = self.state();
        state.journal.batch_delete_calls += 1;

        if let Some(error) = state.delete_failures.pop_front() {
            return Err(error);
        }

        let mut outcome = BatchDeleteOutcome::default();
        for entry in entries {
            let rejected = state.queues.get(queue_url).is_some_and(|queue| {
                queue.leased.iter().any(|leased| {
                    leased.receipt_handle == entry.receipt_handle.as_str()
                        && state.rejected_bodies.contains(&leased.message.body)
                })
            });

            if rejected {
                outcome.failed.push(BatchDeleteFailure {
                    id: entry.id.clone(),
                    code: "InternalError".to_string(),
                    message: Some("entry rejected by test configuration".to_string()),
                    sender_fault: false,
                });
                continue;
            }

            match state.take_leased(queue_url, entry.receipt_handle.as_str()) {
                Some(body) => {
                    state.journal.deleted_bodies.push(body);
                    outcome.successful.push(entry.id.clone());
                }
                None => outcome.failed.push(BatchDeleteFailure {
                    id: entry.id.clone(),
                    code: "ReceiptHandleIsInvalid".to_string(),
                    message: Some(format!(
                        "receipt handle {} is not leased",
                        entry.receipt_handle
                    )),
                    sender_fault: true,
                }),
            }
        }

        Ok(outcome)
    }

    fn provider_name(&self) -> &'static str {
        "InMemory"
    }
}
