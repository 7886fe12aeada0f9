//! Extension points supplied by the embedding application.
//!
//! A processor is specialised for one event shape by two pieces:
//! - a [`PayloadExtractor`] that projects the outer event onto the business
//!   payload (any `Fn(E) -> P` works)
//! - an [`EventHandler`] that performs the business logic for one payload
//!   (wrap an async closure with [`handler_fn`])

use crate::error::BoxError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;

/// Host-neutral view of the invocation that triggered processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    /// Host request identifier
    pub request_id: String,
    /// Point in time at which the host will terminate the invocation
    pub deadline: Option<DateTime<Utc>>,
    /// Identifier of the deployed function, when the host provides one
    pub function_arn: Option<String>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
            function_arn: None,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_function_arn(mut self, function_arn: impl Into<String>) -> Self {
        self.function_arn = Some(function_arn.into());
        self
    }

    /// Time left before the host deadline, if one is known
    pub fn remaining_time(&self) -> Option<chrono::Duration> {
        self.deadline
            .map(|deadline| (deadline - Utc::now()).max(chrono::Duration::zero()))
    }
}

/// Projects a decoded event onto the payload handed to the handler
pub trait PayloadExtractor<E>: Send + Sync {
    type Payload: Send;

    fn extract(&self, event: E) -> Self::Payload;
}

impl<E, P, F> PayloadExtractor<E> for F
where
    F: Fn(E) -> P + Send + Sync,
    P: Send,
{
    type Payload = P;

    fn extract(&self, event: E) -> P {
        self(event)
    }
}

/// Business logic for one payload.
///
/// Errors are not caught by the processor. They abort the current drain cycle
/// and leave the triggering message on the queue.
#[async_trait]
pub trait EventHandler<P: Send + 'static>: Send + Sync {
    async fn handle_event(&self, payload: P, context: &InvocationContext)
        -> Result<(), BoxError>;
}

/// [`EventHandler`] backed by an async closure, see [`handler_fn`]
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Build an [`EventHandler`] from an async closure taking the payload and an
/// owned copy of the invocation context
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

#[async_trait]
impl<P, F, Fut> EventHandler<P> for HandlerFn<F>
where
    P: Send + 'static,
    F: Fn(P, InvocationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    async fn handle_event(
        &self,
        payload: P,
        context: &InvocationContext,
    ) -> Result<(), BoxError> {
        (self.f)(payload, context.clone()).await
    }
}
