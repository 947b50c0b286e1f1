use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;

use crate::adapters::queue::{InputQueue, MessageHandle, OutputQueue, QueueMessage};
use crate::error::QueueError;

/// Upper bound SQS accepts for `MaxNumberOfMessages`.
pub const SQS_MAX_BATCH_SIZE: usize = 10;
/// Upper bound SQS accepts for `WaitTimeSeconds`.
pub const SQS_MAX_WAIT_SECS: i32 = 20;
/// Upper bound SQS accepts for `VisibilityTimeout` (12 hours).
pub const SQS_MAX_VISIBILITY_TIMEOUT_SECS: i32 = 43_200;

#[derive(Debug, Clone)]
pub struct SqsInputQueue {
    sqs_client: aws_sdk_sqs::Client,
    queue_url: String,
    visibility_timeout_secs: Option<i32>,
    wait_time_secs: Option<i32>,
}

impl SqsInputQueue {
    pub fn new(sqs_client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            sqs_client,
            queue_url: queue_url.into(),
            visibility_timeout_secs: None,
            wait_time_secs: None,
        }
    }

    pub fn with_visibility_timeout(mut self, secs: Option<i32>) -> Self {
        self.visibility_timeout_secs = secs;
        self
    }

    pub fn with_wait_time(mut self, secs: i32) -> Self {
        self.wait_time_secs = Some(secs);
        self
    }
}

#[async_trait]
impl InputQueue for SqsInputQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let max_messages = max_messages.clamp(1, SQS_MAX_BATCH_SIZE) as i32;
        let output = self
            .sqs_client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .set_visibility_timeout(self.visibility_timeout_secs)
            .set_wait_time_seconds(self.wait_time_secs)
            .send()
            .await
            .map_err(|error| QueueError::Receive {
                queue: self.queue_url.clone(),
                message: DisplayErrorContext(&error).to_string(),
            })?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| QueueMessage {
                handle: MessageHandle {
                    id: message.message_id.unwrap_or_default(),
                    ack_token: message.receipt_handle.unwrap_or_default(),
                },
                body: message.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<(), QueueError> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&handle.ack_token)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| QueueError::Delete {
                queue: self.queue_url.clone(),
                message_id: handle.id.clone(),
                message: DisplayErrorContext(&error).to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct SqsOutputQueue {
    sqs_client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsOutputQueue {
    pub fn new(sqs_client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            sqs_client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl OutputQueue for SqsOutputQueue {
    async fn send(&self, body: &str) -> Result<(), QueueError> {
        self.sqs_client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| QueueError::Send {
                queue: self.queue_url.clone(),
                message: DisplayErrorContext(&error).to_string(),
            })
    }
}

pub async fn resolve_queue_url(
    sqs_client: &aws_sdk_sqs::Client,
    queue_name: &str,
) -> Result<String, String> {
    let output = sqs_client
        .get_queue_url()
        .queue_name(queue_name)
        .send()
        .await
        .map_err(|error| DisplayErrorContext(&error).to_string())?;

    output
        .queue_url()
        .map(str::to_string)
        .ok_or_else(|| format!("queue '{queue_name}' returned no url"))
}
