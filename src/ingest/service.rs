//! One feed ingestion pass.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::article::extract_article;
use super::fetcher::FeedSource;
use super::types::{ArticleMessage, IngestReport, ParsedEntry};
use super::watermark::WatermarkRepository;
use crate::config::FeedConfig;
use crate::db::DbPool;
use crate::queue::MessageQueue;
use crate::Result;

/// Fetches the feed, enqueues unseen entries and advances the watermark.
pub struct FeedIngestor {
    pool: DbPool,
    source: Arc<dyn FeedSource>,
    queue: Arc<dyn MessageQueue>,
    config: FeedConfig,
}

impl FeedIngestor {
    /// Create an ingestor.
    pub fn new(
        pool: DbPool,
        source: Arc<dyn FeedSource>,
        queue: Arc<dyn MessageQueue>,
        config: FeedConfig,
    ) -> Self {
        Self {
            pool,
            source,
            queue,
            config,
        }
    }

    /// Run one pass.
    ///
    /// A feed fetch or parse failure aborts the pass without touching the
    /// watermark. Otherwise the watermark is set to the time the feed was
    /// requested, whether or not every entry was enqueued.
    pub async fn run_once(&self) -> Result<IngestReport> {
        let watermarks = WatermarkRepository::new(&self.pool);
        let watermark = match watermarks.get().await {
            Ok(mark) => mark,
            Err(e) => {
                warn!("Failed to load scrape watermark: {}", e);
                None
            }
        };
        debug!(?watermark, url = %self.config.url, "Fetching feed");

        // Entries published while article pages are fetched belong to the next pass.
        let scraped_at = Utc::now();
        let feed = self.source.fetch_feed(&self.config.url).await?;
        let total = feed.entries.len();
        let mut report = IngestReport::default();

        for entry in &feed.entries {
            if entry.is_seen(watermark) {
                report.skipped += 1;
                continue;
            }

            let full_article = self.full_article(entry).await;
            let message = ArticleMessage::from_entry(entry, full_article);
            let body = match serde_json::to_string(&message) {
                Ok(body) => body,
                Err(e) => {
                    warn!(id = %message.id, "Failed to encode article message: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            match self.queue.send(&body).await {
                Ok(_) => {
                    debug!(id = %message.id, title = %message.title, "Enqueued article");
                    report.processed += 1;
                }
                Err(e) => {
                    warn!(id = %message.id, "Failed to enqueue article: {}", e);
                    report.failed += 1;
                }
            }
        }

        watermarks.set(scraped_at).await?;

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            total,
            "Feed ingestion completed"
        );
        Ok(report)
    }

    async fn full_article(&self, entry: &ParsedEntry) -> String {
        if !self.config.fetch_full_article {
            return String::new();
        }
        let Some(link) = entry.link.as_deref() else {
            return String::new();
        };

        let html = match self.source.fetch_page(link).await {
            Ok(html) => html,
            Err(e) => {
                warn!(link, "Failed to fetch article page: {}", e);
                return String::new();
            }
        };

        extract_article(
            &html,
            &self.config.article_container_id,
            &self.config.excluded_classes,
        )
        .unwrap_or_else(|| {
            warn!(link, "Article container not found");
            String::new()
        })
    }
}
