//! Category repository.
//!
//! Name uniqueness is enforced by the unique `name_key` index, so create and
//! rename are single conditional writes. The key is the trimmed name folded
//! with Unicode lowercasing.

use std::collections::HashMap;

use sqlx::QueryBuilder;

use super::types::{Category, CategoryUpdate, NewCategory};
use crate::db::{DbPool, Page, PageKey, SQL_NOW};
use crate::error::is_unique_violation;
use crate::{Result, SkratimeError};

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Lookup key for a category name.
fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn name_conflict(name: &str) -> SkratimeError {
    SkratimeError::Conflict(format!("Category with name '{name}' already exists"))
}

/// Repository for category operations.
pub struct CategoryRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a category.
    ///
    /// Returns `Conflict` when another category has the same name, ignoring case.
    pub async fn create(&self, new: &NewCategory) -> Result<Category> {
        let id = uuid::Uuid::new_v4().to_string();
        let sql = format!(
            "INSERT INTO categories (id, name, name_key, description) VALUES ($1, $2, $3, $4)
             RETURNING {CATEGORY_COLUMNS}"
        );

        sqlx::query_as::<_, Category>(&sql)
            .bind(&id)
            .bind(&new.name)
            .bind(name_key(&new.name))
            .bind(&new.description)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    name_conflict(&new.name)
                } else {
                    SkratimeError::Database(e.to_string())
                }
            })
    }

    /// Get a category by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(category)
    }

    /// Get a category by name, ignoring case.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name_key = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(name_key(name))
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(category)
    }

    /// Get the categories with the given IDs.
    ///
    /// Unknown IDs are skipped; results follow the order of `ids`.
    pub async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<Category>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        let mut by_id: HashMap<String, Category> =
            rows.into_iter().map(|c| (c.id.clone(), c)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Get the categories with the given names, ignoring case.
    ///
    /// Unknown names are skipped; results follow the order of `names`.
    pub async fn list_by_names(&self, names: &[String]) -> Result<Vec<Category>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name_key IN ("
        ));
        let mut separated = query.separated(", ");
        for name in names {
            separated.push_bind(name_key(name));
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<Category>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        let mut by_name: HashMap<String, Category> = rows
            .into_iter()
            .map(|c| (name_key(&c.name), c))
            .collect();
        Ok(names
            .iter()
            .filter_map(|name| by_name.remove(&name_key(name)))
            .collect())
    }

    /// List every category, ordered by name.
    pub async fn list_all(&self) -> Result<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name_key");
        let rows = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Scan one page of categories in ID order, starting after `after`.
    pub async fn list_page(&self, limit: usize, after: Option<&PageKey>) -> Result<Page<Category>> {
        let limit = limit.max(1);
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {CATEGORY_COLUMNS} FROM categories"));
        if let Some(key) = after {
            query.push(" WHERE id > ");
            query.push_bind(&key.id);
        }
        query.push(" ORDER BY id LIMIT ");
        query.push_bind((limit + 1) as i64);

        let rows = query
            .build_query_as::<Category>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(Page::from_overfetch(rows, limit, |c| PageKey::new(&c.id)))
    }

    /// Update a category.
    ///
    /// Returns `None` when the category does not exist and `Conflict` when the
    /// new name belongs to another category.
    pub async fn update(&self, id: &str, update: &CategoryUpdate) -> Result<Option<Category>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim());
            separated.push("name_key = ");
            separated.push_bind_unseparated(name_key(name));
        }

        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }

        separated.push(format!("updated_at = {SQL_NOW}"));

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(format!(" RETURNING {CATEGORY_COLUMNS}"));

        query
            .build_query_as::<Category>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| match (&update.name, is_unique_violation(&e)) {
                (Some(name), true) => name_conflict(name.trim()),
                _ => SkratimeError::Database(e.to_string()),
            })
    }

    /// Delete a category.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count categories.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_by_name() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());

        let created = repo
            .create(&NewCategory::new("Security").with_description("Breaches and CVEs"))
            .await
            .unwrap();

        let found = repo.get_by_name("security").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.description.as_deref(), Some("Breaches and CVEs"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());

        repo.create(&NewCategory::new("Malware")).await.unwrap();
        let result = repo.create(&NewCategory::new("MALWARE")).await;

        match result {
            Err(SkratimeError::Conflict(msg)) => {
                assert_eq!(msg, "Category with name 'MALWARE' already exists")
            }
            other => panic!("Expected Conflict, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_ascii_names_fold_case() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());

        let created = repo.create(&NewCategory::new("Ökonomie")).await.unwrap();

        let found = repo.get_by_name("ökonomie").await.unwrap().unwrap();
        assert_eq!(found, created);

        let by_names = repo
            .list_by_names(&["ÖKONOMIE".to_string()])
            .await
            .unwrap();
        assert_eq!(by_names, vec![created.clone()]);

        assert!(matches!(
            repo.create(&NewCategory::new("ökonomie")).await,
            Err(SkratimeError::Conflict(_))
        ));

        let other = repo.create(&NewCategory::new("Ästhetik")).await.unwrap();
        let rename = CategoryUpdate {
            name: Some("ÖKONOMIE".to_string()),
            description: None,
        };
        assert!(matches!(
            repo.update(&other.id, &rename).await,
            Err(SkratimeError::Conflict(_))
        ));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_by_ids_and_names_skip_missing() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());

        let a = repo.create(&NewCategory::new("AI")).await.unwrap();
        let b = repo.create(&NewCategory::new("Cloud")).await.unwrap();

        let by_ids = repo
            .list_by_ids(&[b.id.clone(), "missing".to_string(), a.id.clone()])
            .await
            .unwrap();
        assert_eq!(by_ids, vec![b.clone(), a.clone()]);

        let by_names = repo
            .list_by_names(&["cloud".to_string(), "nope".to_string(), " ai ".to_string()])
            .await
            .unwrap();
        assert_eq!(by_names, vec![b, a]);

        assert!(repo.list_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_page_walks_all_rows() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());
        for name in ["A", "B", "C", "D", "E"] {
            repo.create(&NewCategory::new(name)).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut after: Option<PageKey> = None;
        loop {
            let page = repo.list_page(2, after.as_ref()).await.unwrap();
            assert!(page.items.len() <= 2);
            seen.extend(page.items.into_iter().map(|c| c.name));
            match page.last_key {
                Some(key) => after = Some(key),
                None => break,
            }
        }

        seen.sort();
        assert_eq!(seen, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_update_rename_conflict_and_missing() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());

        let a = repo.create(&NewCategory::new("Privacy")).await.unwrap();
        repo.create(&NewCategory::new("Ransomware")).await.unwrap();

        let rename = CategoryUpdate {
            name: Some("ransomware".to_string()),
            description: None,
        };
        assert!(matches!(
            repo.update(&a.id, &rename).await,
            Err(SkratimeError::Conflict(_))
        ));

        // Renaming to its own name with different case is allowed.
        let recase = CategoryUpdate {
            name: Some("PRIVACY".to_string()),
            description: Some("Data protection".to_string()),
        };
        let updated = repo.update(&a.id, &recase).await.unwrap().unwrap();
        assert_eq!(updated.name, "PRIVACY");
        assert_eq!(updated.description.as_deref(), Some("Data protection"));

        assert!(repo.update("missing", &recase).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup_db().await;
        let repo = CategoryRepository::new(db.pool());

        let a = repo.create(&NewCategory::new("Gadgets")).await.unwrap();
        assert!(repo.delete(&a.id).await.unwrap());
        assert!(!repo.delete(&a.id).await.unwrap());
        assert!(repo.get_by_id(&a.id).await.unwrap().is_none());
    }
}
