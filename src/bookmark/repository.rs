//! Bookmark repository.
//!
//! Bookmarks are keyed by (user_id, news_id). There is no foreign key to the
//! news table, so reads join at query time and silently drop bookmarks whose
//! news item is gone.

use serde::Serialize;

use crate::db::DbPool;
use crate::{Result, SkratimeError};

/// A bookmarked news item as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BookmarkedNews {
    /// News item ID.
    pub id: String,
    pub title: String,
    pub summary: String,
    pub category_id: String,
    pub picture_url: String,
    /// When the bookmark was created.
    pub bookmarked_at: String,
}

/// Repository for bookmark operations.
pub struct BookmarkRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BookmarkRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Add a bookmark.
    ///
    /// Returns true when a new bookmark was created and false when it
    /// already existed.
    pub async fn add(&self, user_id: &str, news_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO bookmarks (user_id, news_id) VALUES ($1, $2)
             ON CONFLICT(user_id, news_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(news_id)
        .execute(self.pool)
        .await
        .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a bookmark. Returns false when there was none.
    pub async fn remove(&self, user_id: &str, news_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND news_id = $2")
            .bind(user_id)
            .bind(news_id)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's bookmarks joined with their news items, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<BookmarkedNews>> {
        let rows = sqlx::query_as::<_, BookmarkedNews>(
            "SELECT n.id, n.title, n.summary, n.category_id, n.picture_url,
                    b.created_at AS bookmarked_at
             FROM bookmarks b
             INNER JOIN news_items n ON n.id = b.news_id
             WHERE b.user_id = $1
             ORDER BY b.created_at DESC, b.rowid DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Count a user's bookmark rows, including dangling ones.
    pub async fn count_for_user(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookmarks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(count)
    }
}
