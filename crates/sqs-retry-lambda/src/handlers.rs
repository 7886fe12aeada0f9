//! Lambda entry points for the message processor.
//!
//! One deployed function serves both paths. Scheduled EventBridge events and
//! explicit `{"action": "retry"}` payloads drain the retry queue; every other
//! payload is treated as a trigger event and processed once.

use crate::context::invocation_context;
use lambda_runtime::{Error, LambdaEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqs_retry_runtime::{
    EventHandler, MessageFormat, MessageProcessor, PayloadExtractor, ProcessingError,
    SerializationError,
};
use tracing::{error, info};

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// Response returned for a processed trigger event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerResponse {
    pub status: &'static str,
    pub request_id: String,
}

/// Check whether an invocation payload asks for a retry-queue drain
pub fn is_retry_invocation(payload: &Value) -> bool {
    let field = |name: &str| payload.get(name).and_then(Value::as_str);

    field("source") == Some("aws.events")
        || field("detail-type") == Some("Scheduled Event")
        || field("action").is_some_and(|action| action.eq_ignore_ascii_case("retry"))
}

/// Decode the Lambda payload into the processor's event type and process it
pub async fn handle_trigger<E, X, H, F>(
    processor: &MessageProcessor<E, X, H, F>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error>
where
    E: DeserializeOwned + Send,
    X: PayloadExtractor<E>,
    X::Payload: 'static,
    H: EventHandler<X::Payload>,
    F: MessageFormat,
{
    let LambdaEvent {
        payload,
        context: lambda_context,
        ..
    } = event;
    let context = invocation_context(&lambda_context);

    let decoded: E = serde_json::from_value(payload).map_err(|source| {
        report_failure(ProcessingError::Deserialization {
            message_id: context.request_id.clone(),
            source: SerializationError::from(source),
        })
    })?;

    processor
        .process(decoded, &context)
        .await
        .map_err(report_failure)?;

    let response = TriggerResponse {
        status: "processed",
        request_id: context.request_id,
    };
    Ok(serde_json::to_value(response)?)
}

/// Drain the retry queue and return the drain report
pub async fn handle_retry<E, X, H, F>(
    processor: &MessageProcessor<E, X, H, F>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error>
where
    E: DeserializeOwned + Send,
    X: PayloadExtractor<E>,
    X::Payload: 'static,
    H: EventHandler<X::Payload>,
    F: MessageFormat,
{
    let context = invocation_context(&event.context);

    let report = processor
        .retry_batch(&context)
        .await
        .map_err(report_failure)?;

    Ok(serde_json::to_value(report)?)
}

/// Route one invocation to the trigger or the retry entry point
pub async fn handle_invocation<E, X, H, F>(
    processor: &MessageProcessor<E, X, H, F>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error>
where
    E: DeserializeOwned + Send,
    X: PayloadExtractor<E>,
    X::Payload: 'static,
    H: EventHandler<X::Payload>,
    F: MessageFormat,
{
    if is_retry_invocation(&event.payload) {
        info!(request_id = %event.context.request_id, "Retry invocation");
        handle_retry(processor, event).await
    } else {
        handle_trigger(processor, event).await
    }
}

fn report_failure(failure: ProcessingError) -> Error {
    error!(error_kind = failure.kind(), error = %failure, "Invocation failed");
    Box::new(failure)
}
