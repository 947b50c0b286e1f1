use clap::Parser;
use pairing_core::contract::DEFAULT_BATCH_SIZE;
use pairing_core::decode::PayloadEncoding;

use crate::adapters::sqs::{SQS_MAX_BATCH_SIZE, SQS_MAX_VISIBILITY_TIMEOUT_SECS, SQS_MAX_WAIT_SECS};
use crate::drain::{DeletePolicy, DrainSettings};
use crate::error::ConfigError;

pub const DEFAULT_INPUT_QUEUE: &str = "step1";
pub const DEFAULT_OUTPUT_QUEUE: &str = "step2";

/// Worker settings. Every flag can also be supplied through its environment
/// variable, which is how the Lambda entry point configures itself.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pairing_drain",
    about = "Drain blob notifications and reconcile companion pairs"
)]
pub struct WorkerArgs {
    /// Bucket holding the paired objects.
    #[arg(long, env = "PAIRING_BUCKET")]
    pub bucket: String,

    /// Queue announcing created objects.
    #[arg(long, env = "PAIRING_INPUT_QUEUE", default_value = DEFAULT_INPUT_QUEUE)]
    pub input_queue: String,

    /// Queue receiving pairing keys of completed pairs.
    #[arg(long, env = "PAIRING_OUTPUT_QUEUE", default_value = DEFAULT_OUTPUT_QUEUE)]
    pub output_queue: String,

    #[arg(long, env = "PAIRING_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// `base64` or `plain`.
    #[arg(long, env = "PAIRING_PAYLOAD_ENCODING", default_value = "base64")]
    pub payload_encoding: PayloadEncoding,

    /// `always` or `after-action`.
    #[arg(long, env = "PAIRING_DELETE_POLICY", default_value = "always")]
    pub delete_policy: DeletePolicy,

    #[arg(long, env = "PAIRING_MAX_BATCHES")]
    pub max_batches: Option<usize>,

    #[arg(long, env = "PAIRING_VISIBILITY_TIMEOUT_SECS")]
    pub visibility_timeout_secs: Option<i32>,

    /// Long-poll wait per receive. Zero may report an empty queue early.
    #[arg(long, env = "PAIRING_RECEIVE_WAIT_SECS", default_value_t = 1)]
    pub receive_wait_secs: i32,

    /// Custom AWS endpoint, e.g. LocalStack.
    #[arg(long, env = "PAIRING_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,
}

impl WorkerArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > SQS_MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                value: self.batch_size,
                max: SQS_MAX_BATCH_SIZE,
            });
        }

        if !(0..=SQS_MAX_WAIT_SECS).contains(&self.receive_wait_secs) {
            return Err(ConfigError::InvalidWaitTime {
                value: self.receive_wait_secs,
                max: SQS_MAX_WAIT_SECS,
            });
        }

        if let Some(timeout) = self.visibility_timeout_secs {
            if !(0..=SQS_MAX_VISIBILITY_TIMEOUT_SECS).contains(&timeout) {
                return Err(ConfigError::InvalidVisibilityTimeout {
                    value: timeout,
                    max: SQS_MAX_VISIBILITY_TIMEOUT_SECS,
                });
            }
        }

        Ok(())
    }

    pub fn drain_settings(&self) -> Result<DrainSettings, ConfigError> {
        self.validate()?;
        Ok(DrainSettings {
            batch_size: self.batch_size,
            payload_encoding: self.payload_encoding,
            delete_policy: self.delete_policy,
            max_batches: self.max_batches,
        })
    }
}
