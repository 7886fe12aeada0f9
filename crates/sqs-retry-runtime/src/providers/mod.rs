//! Queue client implementations.
//!
//! This module contains concrete implementations of the `QueueClient` trait
//! for the supported queue backends.

pub mod aws;
pub mod memory;

pub use aws::{AwsError, SqsQueueClient};
pub use memory::{InMemoryQueue, OperationJournal, ReceiveCall};
