//! Processor configuration resolved once at start-up.
//!
//! The queue region and the retry queue endpoint come from the process
//! environment (`AWS_DEFAULT_REGION` and `RetryQueueUrl`). Both are required.
//! The drain-loop tunables carry defaults and can be overridden through
//! `SQS_RETRY_*` variables.

use crate::error::ConfigurationError;
use crate::message::{QueueUrl, MAX_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable holding the queue service region
pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";

/// Environment variable holding the retry queue endpoint
pub const RETRY_QUEUE_URL_ENV: &str = "RetryQueueUrl";

pub const MAX_MESSAGES_ENV: &str = "SQS_RETRY_MAX_MESSAGES";
pub const WAIT_TIME_SECONDS_ENV: &str = "SQS_RETRY_WAIT_TIME_SECONDS";
pub const ACK_MODE_ENV: &str = "SQS_RETRY_ACK_MODE";

const DEFAULT_MAX_MESSAGES: u32 = MAX_BATCH_SIZE as u32;
const DEFAULT_WAIT_TIME_SECONDS: u32 = 1;

/// Longest long-poll wait the queue service accepts
const MAX_WAIT_TIME_SECONDS: u32 = 20;

/// How successfully processed messages are acknowledged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcknowledgementMode {
    /// Delete each message as soon as its handler returns
    Individual,
    /// Delete the processed messages of a batch with one call
    #[default]
    Batch,
}

impl std::fmt::Display for AcknowledgementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// Configuration for the retry drain loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Queue service region
    pub region: String,

    /// Retry queue to drain
    pub retry_queue_url: QueueUrl,

    /// Messages requested per receive call (1-10)
    pub max_messages: u32,

    /// Long-poll wait per receive call in seconds (1-20)
    pub wait_time_seconds: u32,

    /// Acknowledgement strategy
    pub ack_mode: AcknowledgementMode,
}

impl RetryConfig {
    /// Create configuration with default drain-loop tunables
    pub fn new(region: impl Into<String>, retry_queue_url: QueueUrl) -> Self {
        Self {
            region: region.into(),
            retry_queue_url,
            max_messages: DEFAULT_MAX_MESSAGES,
            wait_time_seconds: DEFAULT_WAIT_TIME_SECONDS,
            ack_mode: AcknowledgementMode::default(),
        }
    }

    pub fn with_max_messages(mut self, max_messages: u32) -> Self {
        self.max_messages = max_messages;
        self
    }

    pub fn with_wait_time_seconds(mut self, seconds: u32) -> Self {
        self.wait_time_seconds = seconds;
        self
    }

    pub fn with_ack_mode(mut self, ack_mode: AcknowledgementMode) -> Self {
        self.ack_mode = ack_mode;
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let region = value_of(REGION_ENV).ok_or_else(|| ConfigurationError::Missing {
            key: REGION_ENV.to_string(),
        })?;
        let retry_queue_url =
            value_of(RETRY_QUEUE_URL_ENV).ok_or_else(|| ConfigurationError::Missing {
                key: RETRY_QUEUE_URL_ENV.to_string(),
            })?;

        let settings = config::Config::builder()
            .set_default("max_messages", i64::from(DEFAULT_MAX_MESSAGES))?
            .set_default("wait_time_seconds", i64::from(DEFAULT_WAIT_TIME_SECONDS))?
            .set_default("ack_mode", AcknowledgementMode::default().to_string())?
            .set_override("region", region)?
            .set_override("retry_queue_url", retry_queue_url)?
            .set_override_option("max_messages", value_of(MAX_MESSAGES_ENV))?
            .set_override_option("wait_time_seconds", value_of(WAIT_TIME_SECONDS_ENV))?
            .set_override_option(
                "ack_mode",
                value_of(ACK_MODE_ENV).map(|value| value.trim().to_ascii_lowercase()),
            )?
            .build()?;

        let config: RetryConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the queue service would otherwise reject
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.region.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: REGION_ENV.to_string(),
            });
        }

        if self.max_messages == 0 || self.max_messages > DEFAULT_MAX_MESSAGES {
            return Err(ConfigurationError::Invalid {
                message: format!(
                    "max_messages must be between 1 and {}, got {}",
                    DEFAULT_MAX_MESSAGES, self.max_messages
                ),
            });
        }

        if self.wait_time_seconds == 0 || self.wait_time_seconds > MAX_WAIT_TIME_SECONDS {
            return Err(ConfigurationError::Invalid {
                message: format!(
                    "wait_time_seconds must be between 1 and {}, got {}",
                    MAX_WAIT_TIME_SECONDS, self.wait_time_seconds
                ),
            });
        }

        Ok(())
    }

    /// Long-poll wait as a duration
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(u64::from(self.wait_time_seconds))
    }
}
