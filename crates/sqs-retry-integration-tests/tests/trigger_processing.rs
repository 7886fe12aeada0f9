//! Integration tests for trigger processing and Lambda routing
//!
//! These tests verify:
//! - Payloads reach the handler unchanged through both entry points
//! - The Lambda router sends scheduled events to the drain loop
//! - Trigger invocations never touch the retry queue

mod common;

use common::{notification_body, retry_queue_url, Harness, OrderNotification, OrderPlaced};
use lambda_runtime::{Context, LambdaEvent};
use serde_json::{json, Value};
use sqs_retry_lambda::handle_invocation;
use sqs_retry_runtime::{AcknowledgementMode, JsonFormat, MessageFormat};

fn awkward_order() -> OrderPlaced {
    OrderPlaced {
        order_id: 42,
        customer: "Zoë \"the\" Łukasiewicz".to_string(),
        note: "line one\nline two\ttabbed \\ backslash \u{1F680} </script>".to_string(),
    }
}

fn lambda_event(payload: Value, request_id: &str) -> LambdaEvent<Value> {
    let mut context = Context::default();
    context.request_id = request_id.to_string();
    context.invoked_function_arn =
        "arn:aws:lambda:eu-west-1:123456789012:function:orders-processor".to_string();
    LambdaEvent::new(payload, context)
}

/// Verify that a queued body reaches the handler byte-for-byte
#[tokio::test]
async fn test_retry_path_round_trips_payload() {
    let harness = Harness::new(AcknowledgementMode::Batch);
    let order = awkward_order();
    let body = notification_body(&order);
    harness.enqueue(&order);

    harness
        .processor
        .retry_batch(&harness.context())
        .await
        .unwrap();

    let handled = harness.handler.handled();
    assert_eq!(handled, vec![order.clone()]);

    let reencoded = notification_body(&handled[0]);
    assert_eq!(reencoded.as_bytes(), body.as_bytes());
}

/// Verify that the trigger path hands the same payload to the handler
#[tokio::test]
async fn test_trigger_path_round_trips_payload() {
    let harness = Harness::new(AcknowledgementMode::Batch);
    let order = awkward_order();
    let notification: OrderNotification = JsonFormat.decode(&notification_body(&order)).unwrap();

    harness
        .processor
        .process(notification, &harness.context())
        .await
        .unwrap();

    assert_eq!(harness.handler.handled(), vec![order]);
    assert!(harness.queue.journal().receive_calls.is_empty());
}

/// Verify that a direct Lambda invocation is processed as a trigger event
#[tokio::test]
async fn test_lambda_trigger_invocation() {
    let harness = Harness::new(AcknowledgementMode::Batch);
    harness.enqueue(&awkward_order());
    let payload = json!({
        "source": "orders",
        "detail": { "order_id": 5, "customer": "ada", "note": "" }
    });

    let response = handle_invocation(&harness.processor, lambda_event(payload, "req-trigger"))
        .await
        .unwrap();

    assert_eq!(response["status"], "processed");
    assert_eq!(harness.handler.handled_ids(), vec![5]);
    assert_eq!(harness.queue.visible_count(&retry_queue_url()), 1);
}

/// Verify that a scheduled Lambda invocation drains the retry queue
#[tokio::test]
async fn test_lambda_scheduled_invocation_drains_queue() {
    let harness = Harness::new(AcknowledgementMode::Individual);
    harness.enqueue_orders(1, 4);
    let schedule = json!({
        "detail-type": "Scheduled Event",
        "source": "aws.events",
        "detail": {}
    });

    let response = handle_invocation(&harness.processor, lambda_event(schedule, "req-schedule"))
        .await
        .unwrap();

    assert_eq!(response["messages_processed"], 4);
    assert_eq!(response["messages_deleted"], 4);
    assert_eq!(harness.handler.handled_ids(), vec![1, 2, 3, 4]);
    assert_eq!(harness.queue.journal().delete_calls, 4);
}

/// Verify that a failing drain surfaces as a failed Lambda invocation
#[tokio::test]
async fn test_lambda_retry_failure_is_reported() {
    let harness = Harness::new(AcknowledgementMode::Batch);
    harness.enqueue_orders(1, 3);
    harness.handler.fail_on(3);

    let result = handle_invocation(
        &harness.processor,
        lambda_event(json!({ "action": "retry" }), "req-retry"),
    )
    .await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("order 3 rejected"), "got: {}", error);
    assert_eq!(harness.queue.journal().deletions(), 2);
}
