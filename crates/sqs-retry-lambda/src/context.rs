//! Lambda context conversion.

use chrono::{DateTime, Utc};
use lambda_runtime::Context;
use sqs_retry_runtime::InvocationContext;

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Project the Lambda context onto the host-neutral [`InvocationContext`].
///
/// A zero deadline or an empty function ARN is reported as absent.
pub fn invocation_context(context: &Context) -> InvocationContext {
    let mut invocation = InvocationContext::new(context.request_id.clone());

    if let Some(deadline) = deadline_from_millis(context.deadline) {
        invocation = invocation.with_deadline(deadline);
    }

    if !context.invoked_function_arn.is_empty() {
        invocation = invocation.with_function_arn(context.invoked_function_arn.clone());
    }

    invocation
}

fn deadline_from_millis(millis: u64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        return None;
    }

    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}
