use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to check existence of '{path}': {message}")]
    Lookup { path: String, message: String },
    #[error("failed to tag '{path}': {message}")]
    Tag { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to receive messages from {queue}: {message}")]
    Receive { queue: String, message: String },
    #[error("failed to delete message {message_id} from {queue}: {message}")]
    Delete {
        queue: String,
        message_id: String,
        message: String,
    },
    #[error("failed to send message to {queue}: {message}")]
    Send { queue: String, message: String },
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to forward pairing key: {0}")]
    Send(#[from] QueueError),
    #[error("failed to tag unpaired object: {0}")]
    Tag(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum DrainError {
    #[error("drain aborted: {0}")]
    Receive(#[from] QueueError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AWS credentials are not available: {0}")]
    MissingCredentials(String),
    #[error("batch size must be between 1 and {max}, got {value}")]
    InvalidBatchSize { value: usize, max: usize },
    #[error("receive wait time must be between 0 and {max} seconds, got {value}")]
    InvalidWaitTime { value: i32, max: i32 },
    #[error("visibility timeout must be between 0 and {max} seconds, got {value}")]
    InvalidVisibilityTimeout { value: i32, max: i32 },
    #[error("failed to resolve url of queue '{queue}': {message}")]
    QueueUrl { queue: String, message: String },
}
