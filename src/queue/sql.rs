//! Queue stored in the application database.

use async_trait::async_trait;

use super::{MessageQueue, QueueMessage};
use crate::db::DbPool;
use crate::{Result, SkratimeError};

/// Table-backed queue.
#[derive(Clone)]
pub struct SqlQueue {
    pool: DbPool,
    name: String,
    visibility_timeout_secs: i64,
}

impl SqlQueue {
    /// Create a handle on the named queue.
    pub fn new(pool: DbPool, name: impl Into<String>, visibility_timeout_secs: u64) -> Self {
        Self {
            pool,
            name: name.into(),
            visibility_timeout_secs: visibility_timeout_secs as i64,
        }
    }

    /// Number of messages in the queue, visible or not.
    pub async fn len(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_messages WHERE queue = $1")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SkratimeError::Queue(e.to_string()))?;
        Ok(count)
    }

    /// Returns true if the queue holds no messages.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl MessageQueue for SqlQueue {
    async fn send(&self, body: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO queue_messages (queue, body, visible_at) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&self.name)
        .bind(body)
        .bind(now_unix())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SkratimeError::Queue(e.to_string()))?;

        Ok(id)
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let now = now_unix();

        let mut messages = sqlx::query_as::<_, QueueMessage>(
            "UPDATE queue_messages
             SET visible_at = $1, receive_count = receive_count + 1
             WHERE id IN (
                 SELECT id FROM queue_messages
                 WHERE queue = $2 AND visible_at <= $3
                 ORDER BY id
                 LIMIT $4
             )
             RETURNING id, body, receive_count",
        )
        .bind(now + self.visibility_timeout_secs)
        .bind(&self.name)
        .bind(now)
        .bind(max as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SkratimeError::Queue(e.to_string()))?;

        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    async fn ack(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM queue_messages WHERE id = $1 AND queue = $2")
            .bind(id)
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .map_err(|e| SkratimeError::Queue(e.to_string()))?;
        Ok(())
    }

    async fn release(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE queue_messages SET visible_at = $1 WHERE id = $2 AND queue = $3")
            .bind(now_unix())
            .bind(id)
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .map_err(|e| SkratimeError::Queue(e.to_string()))?;
        Ok(())
    }
}
