//! Incremental RSS ingestion.
//!
//! A pass fetches the configured feed, skips entries published at or before
//! the stored watermark, scrapes each new entry's article text and enqueues
//! it as an [`ArticleMessage`] for the categorizer.

mod article;
mod fetcher;
mod service;
mod types;
mod updater;
mod watermark;

pub use article::{extract_article, html_to_text};
pub use fetcher::{parse_feed, validate_url, FeedSource, RssFetcher};
pub use service::FeedIngestor;
pub use types::{
    ArticleMessage, IngestReport, ParsedEntry, ParsedFeed, DEFAULT_AUTHOR, DEFAULT_LINK,
    DEFAULT_SUMMARY, DEFAULT_TITLE,
};
pub use updater::{start_feed_updater, FeedUpdater};
pub use watermark::{WatermarkRepository, WATERMARK_KEY};
