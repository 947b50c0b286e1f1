use async_trait::async_trait;

use crate::error::QueueError;

/// Identifies one received delivery of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub id: String,
    /// Receipt needed to acknowledge this particular delivery.
    pub ack_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub handle: MessageHandle,
    pub body: String,
}

#[async_trait]
pub trait InputQueue: Send + Sync {
    /// Returns at most `max_messages`; an empty batch means nothing is visible.
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError>;

    async fn delete(&self, handle: &MessageHandle) -> Result<(), QueueError>;
}

#[async_trait]
pub trait OutputQueue: Send + Sync {
    async fn send(&self, body: &str) -> Result<(), QueueError>;
}
