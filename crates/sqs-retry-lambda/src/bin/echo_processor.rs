//! # Echo Processor
//!
//! Lambda function wiring the retry-queue template with a pass-through
//! extractor and a handler that logs every payload it receives.
//!
//! Configuration comes from the environment: `AWS_DEFAULT_REGION` and
//! `RetryQueueUrl` are required, the `SQS_RETRY_*` tunables are optional.

use anyhow::Context as _;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use sqs_retry_lambda::{handle_invocation, init_logging};
use sqs_retry_runtime::{
    handler_fn, BoxError, HandlerFn, InvocationContext, MessageProcessor, RetryConfig,
    SqsQueueClient,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{error, info};

type EchoFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type EchoHandler = HandlerFn<fn(Value, InvocationContext) -> EchoFuture>;
type EchoProcessor = MessageProcessor<Value, fn(Value) -> Value, EchoHandler>;

async fn echo(payload: Value, context: InvocationContext) -> Result<(), BoxError> {
    info!(
        request_id = %context.request_id,
        payload = %payload,
        "Handled payload"
    );
    Ok(())
}

fn passthrough(event: Value) -> Value {
    event
}

fn boxed_echo(payload: Value, context: InvocationContext) -> EchoFuture {
    Box::pin(echo(payload, context))
}

async fn build_processor() -> anyhow::Result<EchoProcessor> {
    let config = RetryConfig::from_env().context("failed to load retry queue configuration")?;
    info!(
        region = %config.region,
        queue_url = %config.retry_queue_url,
        max_messages = config.max_messages,
        wait_time_seconds = config.wait_time_seconds,
        ack_mode = %config.ack_mode,
        "Loaded retry queue configuration"
    );

    let client = SqsQueueClient::from_region(&config.region).await;

    Ok(MessageProcessor::new(
        Arc::new(client),
        config,
        passthrough as fn(Value) -> Value,
        handler_fn(boxed_echo as fn(Value, InvocationContext) -> EchoFuture),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    info!("Starting echo processor");

    let processor = match build_processor().await {
        Ok(processor) => Arc::new(processor),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to initialise processor; aborting");
            return Err(e.into());
        }
    };

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let processor = Arc::clone(&processor);
        async move { handle_invocation(processor.as_ref(), event).await }
    }))
    .await
}
