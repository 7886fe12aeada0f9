//! # SQS Retry Lambda
//!
//! AWS Lambda host for the retry-queue message processor.
//!
//! - [`handlers`] - Trigger and retry entry points and invocation routing
//! - [`context`] - Conversion of the Lambda context for business handlers
//! - [`telemetry`] - Logging initialisation

pub mod context;
pub mod handlers;
pub mod telemetry;

pub use context::invocation_context;
pub use handlers::{handle_invocation, handle_retry, handle_trigger, is_retry_invocation};
pub use telemetry::init_logging;
