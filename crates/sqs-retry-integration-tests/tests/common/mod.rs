//! Common test utilities for sqs-retry integration tests
//!
//! This module provides:
//! - An order event shape wrapped in a notification envelope
//! - A recording handler with per-order failure injection
//! - A harness bundling an in-memory queue with a processor

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqs_retry_runtime::{
    AcknowledgementMode, BoxError, EventHandler, InMemoryQueue, InvocationContext, JsonFormat,
    MessageFormat, MessageProcessor, QueueUrl, RetryConfig,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ============================================================================
// Event Fixtures
// ============================================================================

/// Business payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: u32,
    pub customer: String,
    pub note: String,
}

/// Outer event as published by the upstream system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNotification {
    pub source: String,
    pub detail: OrderPlaced,
}

#[allow(dead_code)]
pub fn order(order_id: u32) -> OrderPlaced {
    OrderPlaced {
        order_id,
        customer: format!("customer-{}", order_id),
        note: String::new(),
    }
}

/// Encode an order the way the upstream system writes it to the retry queue
pub fn notification_body(order: &OrderPlaced) -> String {
    JsonFormat
        .encode(&OrderNotification {
            source: "orders".to_string(),
            detail: order.clone(),
        })
        .unwrap()
}

pub fn extract_order(notification: OrderNotification) -> OrderPlaced {
    notification.detail
}

// ============================================================================
// Recording Handler
// ============================================================================

/// Handler recording every order it is given, failing for selected order IDs
#[derive(Clone, Default)]
pub struct RecordingHandler {
    handled: Arc<Mutex<Vec<OrderPlaced>>>,
    failing: Arc<Mutex<HashSet<u32>>>,
}

impl RecordingHandler {
    #[allow(dead_code)]
    pub fn fail_on(&self, order_id: u32) {
        self.failing.lock().unwrap().insert(order_id);
    }

    #[allow(dead_code)]
    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn handled(&self) -> Vec<OrderPlaced> {
        self.handled.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn handled_ids(&self) -> Vec<u32> {
        self.handled().iter().map(|order| order.order_id).collect()
    }
}

#[async_trait]
impl EventHandler<OrderPlaced> for RecordingHandler {
    async fn handle_event(
        &self,
        payload: OrderPlaced,
        _context: &InvocationContext,
    ) -> Result<(), BoxError> {
        let order_id = payload.order_id;
        self.handled.lock().unwrap().push(payload);
        if self.failing.lock().unwrap().contains(&order_id) {
            return Err(format!("order {} rejected by downstream", order_id).into());
        }
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub type OrderProcessor =
    MessageProcessor<OrderNotification, fn(OrderNotification) -> OrderPlaced, RecordingHandler>;

pub fn retry_queue_url() -> QueueUrl {
    "https://sqs.eu-west-1.amazonaws.com/123456789012/orders-retry"
        .parse()
        .unwrap()
}

/// In-memory queue, handler and processor wired together
pub struct Harness {
    pub queue: InMemoryQueue,
    pub handler: RecordingHandler,
    pub processor: OrderProcessor,
}

impl Harness {
    pub fn new(ack_mode: AcknowledgementMode) -> Self {
        Self::with_config(RetryConfig::new("eu-west-1", retry_queue_url()).with_ack_mode(ack_mode))
    }

    pub fn with_config(config: RetryConfig) -> Self {
        let queue = InMemoryQueue::new();
        let handler = RecordingHandler::default();
        let processor = MessageProcessor::new(
            Arc::new(queue.clone()),
            config,
            extract_order as fn(OrderNotification) -> OrderPlaced,
            handler.clone(),
        );

        Self {
            queue,
            handler,
            processor,
        }
    }

    /// Enqueue orders `first..=last` in order
    #[allow(dead_code)]
    pub fn enqueue_orders(&self, first: u32, last: u32) {
        for order_id in first..=last {
            self.enqueue(&order(order_id));
        }
    }

    pub fn enqueue(&self, order: &OrderPlaced) -> String {
        self.queue
            .send_message(&retry_queue_url(), notification_body(order))
    }

    #[allow(dead_code)]
    pub fn context(&self) -> InvocationContext {
        InvocationContext::new("integration-test")
    }
}

#[allow(dead_code)]
pub const BOTH_MODES: [AcknowledgementMode; 2] =
    [AcknowledgementMode::Individual, AcknowledgementMode::Batch];
