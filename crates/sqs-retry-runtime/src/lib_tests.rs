//! Tests for the sqs-retry-runtime crate root.

use super::*;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn retry_url() -> QueueUrl {
    "https://sqs.us-east-1.amazonaws.com/000000000000/payments-retry"
        .parse()
        .unwrap()
}

#[test]
fn test_queue_url_validation() {
    assert!(QueueUrl::new("https://sqs.us-east-1.amazonaws.com/1/q".to_string()).is_ok());
    assert!(QueueUrl::new("http://localhost:4566/000000000000/q".to_string()).is_ok());

    assert!(QueueUrl::new("".to_string()).is_err());
    assert!(QueueUrl::new("   ".to_string()).is_err());
    assert!(QueueUrl::new("sqs.us-east-1.amazonaws.com/1/q".to_string()).is_err());
    assert!(QueueUrl::new("https://sqs.example.com/1/q with space".to_string()).is_err());
}

#[test]
fn test_default_acknowledgement_mode_is_batch() {
    assert_eq!(AcknowledgementMode::default(), AcknowledgementMode::Batch);
    assert_eq!(RetryConfig::new("us-east-1", retry_url()).ack_mode, AcknowledgementMode::Batch);
}

#[test]
fn test_batch_size_limit() {
    assert_eq!(MAX_BATCH_SIZE, 10);
}

#[test]
fn test_drain_report_serializes_counters() {
    let report = DrainReport {
        receive_calls: 2,
        messages_processed: 3,
        messages_deleted: 3,
        delete_failures: 0,
    };

    let json = serde_json::to_value(report).unwrap();

    assert_eq!(json["receive_calls"], 2);
    assert_eq!(json["messages_deleted"], 3);
}

#[test]
fn test_processor_through_trait_object() {
    let queue = InMemoryQueue::new();
    let url = retry_url();
    queue.send_messages(&url, [r#""first""#, r#""second""#]);
    let client: Arc<dyn QueueClient> = Arc::new(queue.clone());

    let processor = MessageProcessor::<String, _, _>::new(
        client,
        RetryConfig::new("us-east-1", url.clone()),
        |event: String| event.len(),
        handler_fn(|length: usize, _context: InvocationContext| async move {
            if length == 0 {
                return Err::<(), BoxError>("empty".into());
            }
            Ok(())
        }),
    );

    let report = assert_ok!(tokio_test::block_on(
        processor.retry_batch(&InvocationContext::new("req"))
    ));
    assert_eq!(report.messages_deleted, 2);

    queue.send_message(&url, r#""""#);
    let error = assert_err!(tokio_test::block_on(
        processor.retry_batch(&InvocationContext::new("req"))
    ));
    assert_eq!(error.kind(), "handler");
}
