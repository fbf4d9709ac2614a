//! News item types.

use serde::Serialize;

use crate::category::UNCATEGORIZED;

/// Default page size for news scans.
pub const NEWS_PAGE_SIZE: usize = 10;

/// A stored news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Category ID, or the `uncategorized` sentinel.
    pub category_id: String,
    pub picture_url: String,
    pub news_link: String,
    /// Publication time (RFC 3339, UTC), when the source gave one.
    pub published_at: Option<String>,
    pub author: String,
    pub full_article: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New news item for creation.
#[derive(Debug, Clone)]
pub struct NewNewsItem {
    /// Explicit ID. A UUID is generated when absent.
    pub id: Option<String>,
    pub title: String,
    pub summary: String,
    pub category_id: String,
    pub picture_url: String,
    pub news_link: String,
    pub published_at: Option<String>,
    pub author: String,
    pub full_article: String,
}

impl NewNewsItem {
    /// Create a new item with the required fields.
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            summary: summary.into(),
            category_id: category_id.into(),
            picture_url: String::new(),
            news_link: String::new(),
            published_at: None,
            author: String::new(),
            full_article: String::new(),
        }
    }

    /// Create an item that has not been categorized.
    pub fn uncategorized(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(title, summary, UNCATEGORIZED)
    }

    /// Use a fixed ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the picture URL.
    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = url.into();
        self
    }

    /// Set the link to the source article.
    pub fn with_news_link(mut self, link: impl Into<String>) -> Self {
        self.news_link = link.into();
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the full article text.
    pub fn with_full_article(mut self, text: impl Into<String>) -> Self {
        self.full_article = text.into();
        self
    }
}

/// Partial news item update.
#[derive(Debug, Clone, Default)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub category_id: Option<String>,
    pub picture_url: Option<String>,
    pub news_link: Option<String>,
    pub published_at: Option<String>,
    pub author: Option<String>,
    pub full_article: Option<String>,
}

impl NewsUpdate {
    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.category_id.is_none()
            && self.picture_url.is_none()
            && self.news_link.is_none()
            && self.published_at.is_none()
            && self.author.is_none()
            && self.full_article.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncategorized_builder() {
        let item = NewNewsItem::uncategorized("Title", "Summary")
            .with_id("fixed")
            .with_author("Desk");
        assert_eq!(item.category_id, UNCATEGORIZED);
        assert_eq!(item.id.as_deref(), Some("fixed"));
        assert_eq!(item.author, "Desk");
        assert!(item.published_at.is_none());
    }

    #[test]
    fn test_update_is_empty() {
        assert!(NewsUpdate::default().is_empty());
        let update = NewsUpdate {
            author: Some("x".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
