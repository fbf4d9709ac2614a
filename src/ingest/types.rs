//! Feed and queue message types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::news::NewNewsItem;

/// Default title for entries without one.
pub const DEFAULT_TITLE: &str = "No Title";

/// Default summary for entries without one.
pub const DEFAULT_SUMMARY: &str = "No Summary";

/// Default author for entries without one.
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// Default link for entries without one.
pub const DEFAULT_LINK: &str = "No Link";

/// A parsed feed.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<ParsedEntry>,
}

/// A parsed feed entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEntry {
    pub title: Option<String>,
    /// Summary with HTML removed.
    pub summary: Option<String>,
    /// First link of the entry.
    pub link: Option<String>,
    /// First image link or image enclosure.
    pub image_url: Option<String>,
    pub author: Option<String>,
    /// Published time, or updated time when the feed gives no publish date.
    pub published_at: Option<DateTime<Utc>>,
}

impl ParsedEntry {
    /// Returns true if the entry was published at or before `watermark`.
    ///
    /// Entries without a timestamp are never considered seen.
    pub fn is_seen(&self, watermark: Option<DateTime<Utc>>) -> bool {
        match (self.published_at, watermark) {
            (Some(published), Some(mark)) => published <= mark,
            _ => false,
        }
    }
}

fn new_article_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_summary() -> String {
    DEFAULT_SUMMARY.to_string()
}

fn default_link() -> String {
    DEFAULT_LINK.to_string()
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

/// Queue message describing an article waiting to be categorized.
///
/// Missing fields decode to the same defaults `from_entry` fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMessage {
    #[serde(default = "new_article_id")]
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_summary")]
    pub summary: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default = "default_link")]
    pub news_link: String,
    #[serde(default)]
    pub published_at_utc: Option<String>,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub full_article: String,
}

impl ArticleMessage {
    /// Build a message from a feed entry, filling defaults.
    pub fn from_entry(entry: &ParsedEntry, full_article: String) -> Self {
        Self {
            id: new_article_id(),
            title: entry.title.clone().unwrap_or_else(default_title),
            summary: entry.summary.clone().unwrap_or_else(default_summary),
            picture_url: entry.image_url.clone(),
            news_link: entry.link.clone().unwrap_or_else(default_link),
            published_at_utc: entry
                .published_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, false)),
            author: entry.author.clone().unwrap_or_else(default_author),
            full_article,
        }
    }

    /// Convert into a news item with the given category.
    pub fn into_news_item(self, category_id: impl Into<String>) -> NewNewsItem {
        let mut item = NewNewsItem::new(self.title, self.summary, category_id)
            .with_id(self.id)
            .with_picture_url(self.picture_url.unwrap_or_default())
            .with_news_link(self.news_link)
            .with_author(self.author)
            .with_full_article(self.full_article);
        if let Some(published_at) = self.published_at_utc {
            item = item.with_published_at(published_at);
        }
        item
    }
}

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Entries enqueued.
    pub processed: usize,
    /// Entries at or before the watermark.
    pub skipped: usize,
    /// Entries that could not be enqueued.
    pub failed: usize,
}
