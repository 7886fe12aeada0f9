//! Tests for message types.

use super::*;

#[test]
fn test_queue_url_validation() {
    // Valid URLs
    assert!(QueueUrl::new("https://sqs.eu-west-1.amazonaws.com/123456789012/retry".to_string()).is_ok());
    assert!(QueueUrl::new("http://localhost:4566/000000000000/retry".to_string()).is_ok());

    // Invalid URLs
    assert!(QueueUrl::new("".to_string()).is_err());
    assert!(QueueUrl::new("   ".to_string()).is_err());
    assert!(QueueUrl::new("sqs.eu-west-1.amazonaws.com/123/retry".to_string()).is_err());
    assert!(QueueUrl::new("https://sqs.example.com/a b".to_string()).is_err());
}

#[test]
fn test_queue_url_trims_surrounding_whitespace() {
    let url = QueueUrl::new("  https://sqs.example.com/1/retry\n".to_string()).unwrap();
    assert_eq!(url.as_str(), "https://sqs.example.com/1/retry");
}

#[test]
fn test_queue_url_serde_validates() {
    let url: QueueUrl = serde_json::from_str("\"https://sqs.example.com/1/retry\"").unwrap();
    assert_eq!(url.to_string(), "https://sqs.example.com/1/retry");

    let result = serde_json::from_str::<QueueUrl>("\"not-a-url\"");
    assert!(result.is_err());
}

#[test]
fn test_receipt_handle_requires_value() {
    assert!(ReceiptHandle::new(String::new()).is_err());

    let handle = ReceiptHandle::new("AQEB-lease".to_string()).unwrap();
    assert_eq!(handle.as_str(), "AQEB-lease");
}

#[test]
fn test_delete_entry_uses_batch_position_as_id() {
    let handle = ReceiptHandle::new("h-3".to_string()).unwrap();
    let entry = DeleteEntry::for_position(3, handle.clone());

    assert_eq!(entry.id, "3");
    assert_eq!(entry.receipt_handle, handle);
}

#[test]
fn test_batch_delete_outcome_success_check() {
    let mut outcome = BatchDeleteOutcome {
        successful: vec!["0".to_string(), "1".to_string()],
        failed: vec![],
    };
    assert!(outcome.is_complete_success());

    outcome.failed.push(BatchDeleteFailure {
        id: "2".to_string(),
        code: "ReceiptHandleIsInvalid".to_string(),
        message: None,
        sender_fault: true,
    });
    assert!(!outcome.is_complete_success());
}
