//! Queue consumer that categorizes articles and stores them as news items.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::model::TextModel;
use super::prompt::{build_prompt, CategoryVocabulary};
use crate::category::{CategoryRepository, UNCATEGORIZED};
use crate::db::DbPool;
use crate::ingest::ArticleMessage;
use crate::news::NewsRepository;
use crate::queue::{MessageQueue, QueueMessage};
use crate::Result;

/// Outcome counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub received: usize,
    /// Messages written as news items (or already present) and acknowledged.
    pub stored: usize,
    /// Messages released for redelivery after a write failure.
    pub released: usize,
    /// Undecodable or exhausted messages that were deleted.
    pub dropped: usize,
}

/// Assigns categories to queued articles.
pub struct Categorizer {
    pool: DbPool,
    model: Arc<dyn TextModel>,
    queue: Arc<dyn MessageQueue>,
    max_receive_count: i64,
}

impl Categorizer {
    /// Create a categorizer.
    pub fn new(
        pool: DbPool,
        model: Arc<dyn TextModel>,
        queue: Arc<dyn MessageQueue>,
        max_receive_count: i64,
    ) -> Self {
        Self {
            pool,
            model,
            queue,
            max_receive_count: max_receive_count.max(1),
        }
    }

    /// Pick a category ID for a summary. Never fails: anything that cannot
    /// be matched is `uncategorized`.
    pub async fn categorize(&self, vocabulary: &CategoryVocabulary, summary: &str) -> String {
        if summary.trim().is_empty() {
            warn!("Summary missing; defaulting category");
            return UNCATEGORIZED.to_string();
        }
        if vocabulary.is_empty() {
            warn!("No categories available; defaulting category");
            return UNCATEGORIZED.to_string();
        }

        let prompt = build_prompt(&vocabulary.names(), summary);
        let raw = match self.model.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Model invocation failed: {}", e);
                return UNCATEGORIZED.to_string();
            }
        };
        debug!(raw_output = %raw, "Model response");

        match vocabulary.resolve(&raw) {
            Some(id) => id.to_string(),
            None => {
                warn!(raw_output = %raw, "No category match found");
                UNCATEGORIZED.to_string()
            }
        }
    }

    /// Receive and handle up to `batch_size` messages.
    pub async fn process_batch(&self, batch_size: usize) -> Result<BatchReport> {
        let messages = self.queue.receive(batch_size).await?;
        let mut report = BatchReport {
            received: messages.len(),
            ..Default::default()
        };
        if messages.is_empty() {
            return Ok(report);
        }

        let vocabulary = match CategoryRepository::new(&self.pool).list_all().await {
            Ok(categories) => CategoryVocabulary::new(&categories),
            Err(e) => {
                error!("Failed to load categories: {}", e);
                CategoryVocabulary::default()
            }
        };

        for message in messages {
            self.handle(&vocabulary, message, &mut report).await;
        }

        info!(
            received = report.received,
            stored = report.stored,
            released = report.released,
            dropped = report.dropped,
            "Categorizer batch completed"
        );
        Ok(report)
    }

    async fn handle(
        &self,
        vocabulary: &CategoryVocabulary,
        message: QueueMessage,
        report: &mut BatchReport,
    ) {
        let article: ArticleMessage = match serde_json::from_str(&message.body) {
            Ok(article) => article,
            Err(e) => {
                error!(message_id = message.id, "Dropping undecodable message: {}", e);
                self.ack(message.id).await;
                report.dropped += 1;
                return;
            }
        };

        let category_id = self.categorize(vocabulary, &article.summary).await;
        let news_id = article.id.clone();
        let item = article.into_news_item(&category_id);

        match NewsRepository::new(&self.pool).insert_if_absent(&item).await {
            Ok(inserted) => {
                if inserted {
                    info!(news_id = %news_id, category_id = %category_id, "Stored news item");
                } else {
                    debug!(news_id = %news_id, "News item already stored");
                }
                self.ack(message.id).await;
                report.stored += 1;
            }
            Err(e) if message.receive_count >= self.max_receive_count => {
                error!(
                    message_id = message.id,
                    news_id = %news_id,
                    receive_count = message.receive_count,
                    "Dropping message after repeated write failures: {}",
                    e
                );
                self.ack(message.id).await;
                report.dropped += 1;
            }
            Err(e) => {
                warn!(
                    message_id = message.id,
                    news_id = %news_id,
                    "Write failed, releasing: {}", e
                );
                if let Err(e) = self.queue.release(message.id).await {
                    warn!(message_id = message.id, "Failed to release message: {}", e);
                }
                report.released += 1;
            }
        }
    }

    async fn ack(&self, id: i64) {
        if let Err(e) = self.queue.ack(id).await {
            warn!(message_id = id, "Failed to acknowledge message: {}", e);
        }
    }
}
