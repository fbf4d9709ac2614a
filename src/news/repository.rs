//! News item repository.

use std::collections::HashMap;

use sqlx::QueryBuilder;

use super::types::{NewNewsItem, NewsItem, NewsUpdate};
use crate::db::{DbPool, Page, PageKey, SQL_NOW};
use crate::error::is_unique_violation;
use crate::{Result, SkratimeError};

const NEWS_COLUMNS: &str = "id, title, summary, category_id, picture_url, news_link, \
                            published_at, author, full_article, created_at, updated_at";

/// Newest first: publication time when known, insertion time otherwise.
const NEWEST_FIRST: &str = "COALESCE(published_at, created_at) DESC, id DESC";

/// Repository for news item operations.
pub struct NewsRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> NewsRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a news item.
    ///
    /// Returns `Conflict` if an item with the same ID exists.
    pub async fn create(&self, item: &NewNewsItem) -> Result<NewsItem> {
        let id = item
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let sql = format!(
            "INSERT INTO news_items
                (id, title, summary, category_id, picture_url, news_link, published_at, author, full_article)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {NEWS_COLUMNS}"
        );

        sqlx::query_as::<_, NewsItem>(&sql)
            .bind(&id)
            .bind(&item.title)
            .bind(&item.summary)
            .bind(&item.category_id)
            .bind(&item.picture_url)
            .bind(&item.news_link)
            .bind(&item.published_at)
            .bind(&item.author)
            .bind(&item.full_article)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SkratimeError::Conflict(format!("News item '{id}' already exists"))
                } else {
                    SkratimeError::Database(e.to_string())
                }
            })
    }

    /// Insert a news item unless one with the same ID exists.
    ///
    /// Returns true when a row was written. Used for queue deliveries, which
    /// may repeat.
    pub async fn insert_if_absent(&self, item: &NewNewsItem) -> Result<bool> {
        let id = item
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let result = sqlx::query(
            "INSERT INTO news_items
                (id, title, summary, category_id, picture_url, news_link, published_at, author, full_article)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&id)
        .bind(&item.title)
        .bind(&item.summary)
        .bind(&item.category_id)
        .bind(&item.picture_url)
        .bind(&item.news_link)
        .bind(&item.published_at)
        .bind(&item.author)
        .bind(&item.full_article)
        .execute(self.pool)
        .await
        .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a news item by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<NewsItem>> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news_items WHERE id = $1");
        let item = sqlx::query_as::<_, NewsItem>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(item)
    }

    /// Get the news items with the given IDs, keyed by ID.
    pub async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, NewsItem>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {NEWS_COLUMNS} FROM news_items WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<NewsItem>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|n| (n.id.clone(), n)).collect())
    }

    /// Scan one page of news items in ID order.
    pub async fn list_page(&self, limit: usize, after: Option<&PageKey>) -> Result<Page<NewsItem>> {
        let limit = limit.max(1);
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {NEWS_COLUMNS} FROM news_items"));
        if let Some(key) = after {
            query.push(" WHERE id > ");
            query.push_bind(&key.id);
        }
        query.push(" ORDER BY id LIMIT ");
        query.push_bind((limit + 1) as i64);

        let rows = query
            .build_query_as::<NewsItem>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(Page::from_overfetch(rows, limit, |n| PageKey::new(&n.id)))
    }

    /// Scan one page of a category's news items through the category index.
    pub async fn list_category_page(
        &self,
        category_id: &str,
        limit: usize,
        after: Option<&PageKey>,
    ) -> Result<Page<NewsItem>> {
        let limit = limit.max(1);
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {NEWS_COLUMNS} FROM news_items WHERE category_id = "
        ));
        query.push_bind(category_id);
        if let Some(key) = after {
            query.push(" AND id > ");
            query.push_bind(&key.id);
        }
        query.push(" ORDER BY id LIMIT ");
        query.push_bind((limit + 1) as i64);

        let rows = query
            .build_query_as::<NewsItem>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(Page::from_overfetch(rows, limit, |n| {
            PageKey::in_category(&n.id, &n.category_id)
        }))
    }

    /// Latest news items of a category, newest first.
    pub async fn latest_in_category(
        &self,
        category_id: &str,
        limit: usize,
    ) -> Result<Vec<NewsItem>> {
        let sql = format!(
            "SELECT {NEWS_COLUMNS} FROM news_items WHERE category_id = $1
             ORDER BY {NEWEST_FIRST} LIMIT $2"
        );
        let rows = sqlx::query_as::<_, NewsItem>(&sql)
            .bind(category_id)
            .bind(limit as i64)
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Apply a partial update. Returns false when the item does not exist.
    pub async fn update(&self, id: &str, update: &NewsUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(self.get_by_id(id).await?.is_some());
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE news_items SET ");
        let mut separated = query.separated(", ");

        let fields = [
            ("title", &update.title),
            ("summary", &update.summary),
            ("category_id", &update.category_id),
            ("picture_url", &update.picture_url),
            ("news_link", &update.news_link),
            ("published_at", &update.published_at),
            ("author", &update.author),
            ("full_article", &update.full_article),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value);
            }
        }

        separated.push(format!("updated_at = {SQL_NOW}"));

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a news item. Returns false when it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM news_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count news items.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_items")
            .fetch_one(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::UNCATEGORIZED;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample(title: &str, category_id: &str) -> NewNewsItem {
        NewNewsItem::new(title, format!("{title} summary"), category_id)
            .with_picture_url("https://img.example.com/a.jpg")
            .with_news_link("https://news.example.com/a")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        let created = repo
            .create(&sample("Patch Tuesday", "cat-1").with_author("Desk"))
            .await
            .unwrap();
        let found = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.author, "Desk");
        assert!(found.published_at.is_none());
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        let item = NewNewsItem::uncategorized("Once", "only once").with_id("msg-1");
        assert!(repo.insert_if_absent(&item).await.unwrap());
        assert!(!repo.insert_if_absent(&item).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        let stored = repo.get_by_id("msg-1").await.unwrap().unwrap();
        assert_eq!(stored.category_id, UNCATEGORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        repo.create(&sample("A", "c").with_id("same")).await.unwrap();
        assert!(matches!(
            repo.create(&sample("B", "c").with_id("same")).await,
            Err(SkratimeError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_partial() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        let created = repo.create(&sample("Old title", "c")).await.unwrap();
        let update = NewsUpdate {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        assert!(repo.update(&created.id, &update).await.unwrap());

        let found = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.title, "New title");
        assert_eq!(found.summary, created.summary);

        assert!(!repo.update("missing", &update).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        assert!(!repo.delete("does-not-exist").await.unwrap());

        let created = repo.create(&sample("Gone", "c")).await.unwrap();
        assert!(repo.delete(&created.id).await.unwrap());
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_page_and_latest() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        for (i, day) in ["01", "03", "02"].iter().enumerate() {
            repo.create(
                &sample(&format!("AI {i}"), "ai")
                    .with_published_at(format!("2024-05-{day}T10:00:00+00:00")),
            )
            .await
            .unwrap();
        }
        repo.create(&sample("Other", "cloud")).await.unwrap();

        let page = repo.list_category_page("ai", 2, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        let key = page.last_key.clone().unwrap();
        assert_eq!(key.category_id.as_deref(), Some("ai"));

        let rest = repo.list_category_page("ai", 2, Some(&key)).await.unwrap();
        assert_eq!(rest.items.len(), 1);
        assert!(rest.last_key.is_none());

        let latest = repo.latest_in_category("ai", 2).await.unwrap();
        let titles: Vec<_> = latest.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["AI 1", "AI 2"]);
    }

    #[tokio::test]
    async fn test_get_many() {
        let db = setup_db().await;
        let repo = NewsRepository::new(db.pool());

        let a = repo.create(&sample("A", "c")).await.unwrap();
        let found = repo
            .get_many(&[a.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&a.id));
    }
}
