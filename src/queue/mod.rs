//! Message queue between the feed fetcher and the categorizer.
//!
//! Messages are claimed with a visibility timeout: a received message is
//! hidden from other receivers until it is acknowledged (deleted), released
//! or the timeout lapses.

mod sql;

pub use sql::SqlQueue;

use async_trait::async_trait;

use crate::Result;

/// Queue carrying `ArticleMessage` bodies.
pub const ARTICLE_QUEUE: &str = "articles";

/// A received message.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct QueueMessage {
    /// Receipt handle.
    pub id: i64,
    /// JSON body.
    pub body: String,
    /// Number of times the message has been delivered, this one included.
    pub receive_count: i64,
}

/// At-least-once message queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue a message body. Returns its ID.
    async fn send(&self, body: &str) -> Result<i64>;

    /// Claim up to `max` visible messages, oldest first.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>>;

    /// Delete a processed message.
    async fn ack(&self, id: i64) -> Result<()>;

    /// Make a claimed message visible again for redelivery.
    async fn release(&self, id: i64) -> Result<()>;
}
