//! User accounts of the identity store.

use super::attributes::decode_list;
use crate::db::{DbPool, SQL_NOW};
use crate::error::is_unique_violation;
use crate::{Result, SkratimeError};

const USER_COLUMNS: &str = "id, email, password, full_name, email_verified, enabled, user_status, \
                            notion_link, user_interests, personal_categories, created_at, last_login";

/// User row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password: String,
    full_name: String,
    email_verified: bool,
    enabled: bool,
    user_status: String,
    notion_link: String,
    user_interests: String,
    personal_categories: String,
    created_at: String,
    last_login: Option<String>,
}

/// A user account.
#[derive(Debug, Clone)]
pub struct User {
    /// Subject identifier (UUID).
    pub id: String,
    pub email: String,
    /// Argon2 hash.
    pub password: String,
    pub full_name: String,
    pub email_verified: bool,
    pub enabled: bool,
    pub user_status: String,
    pub notion_link: String,
    pub user_interests: Vec<String>,
    pub personal_categories: Vec<String>,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password: row.password,
            full_name: row.full_name,
            email_verified: row.email_verified,
            enabled: row.enabled,
            user_status: row.user_status,
            notion_link: row.notion_link,
            user_interests: decode_list(&row.user_interests),
            personal_categories: decode_list(&row.personal_categories),
            created_at: row.created_at,
            last_login: row.last_login,
        }
    }
}

/// New user for creation. List attributes are already JSON-encoded.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub notion_link: String,
    pub user_interests: String,
    pub personal_categories: String,
}

/// Profile fields to change. List attributes are already JSON-encoded.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub notion_link: Option<String>,
    pub user_interests: Option<String>,
    pub personal_categories: Option<String>,
}

impl ProfileUpdate {
    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.notion_link.is_none()
            && self.user_interests.is_none()
            && self.personal_categories.is_none()
    }
}

/// Repository for user accounts.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a user. Returns `Conflict` when the email is taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id = uuid::Uuid::new_v4().to_string();
        let sql = format!(
            "INSERT INTO users (id, email, password, full_name, notion_link, user_interests, personal_categories)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&id)
            .bind(new_user.email.trim())
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .bind(&new_user.notion_link)
            .bind(&new_user.user_interests)
            .bind(&new_user.personal_categories)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SkratimeError::Conflict("An account with this email already exists".into())
                } else {
                    SkratimeError::Database(e.to_string())
                }
            })?;

        Ok(row.into())
    }

    /// Get a user by subject ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Get a user by email, ignoring case.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 COLLATE NOCASE");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Apply a profile update. Returns the updated user, or None if missing.
    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: sqlx::QueryBuilder<sqlx::Sqlite> =
            sqlx::QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        let fields = [
            ("full_name", &update.full_name),
            ("notion_link", &update.notion_link),
            ("user_interests", &update.user_interests),
            ("personal_categories", &update.personal_categories),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value);
            }
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(format!(" RETURNING {USER_COLUMNS}"));

        let row = query
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: &str) -> Result<()> {
        let sql = format!("UPDATE users SET last_login = {SQL_NOW} WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;
        Ok(())
    }

    /// Enable or disable an account.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET enabled = $1 WHERE id = $2")
            .bind(enabled)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Reader".to_string(),
            notion_link: String::new(),
            user_interests: "[]".to_string(),
            personal_categories: r#"["ai"]"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&new_user("Reader@Example.com")).await.unwrap();
        assert_eq!(user.personal_categories, vec!["ai"]);
        assert!(user.enabled);
        assert_eq!(user.user_status, "CONFIRMED");

        let by_email = repo.get_by_email("reader@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.get_by_id(&user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        repo.create(&new_user("a@example.com")).await.unwrap();
        assert!(matches!(
            repo.create(&new_user("A@EXAMPLE.COM")).await,
            Err(SkratimeError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&new_user("p@example.com")).await.unwrap();

        let update = ProfileUpdate {
            notion_link: Some("https://notion.so/page".to_string()),
            personal_categories: Some(r#"["cloud","ai"]"#.to_string()),
            ..Default::default()
        };
        let updated = repo.update_profile(&user.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.notion_link, "https://notion.so/page");
        assert_eq!(updated.personal_categories, vec!["cloud", "ai"]);
        assert_eq!(updated.full_name, "Reader");

        assert!(repo
            .update_profile("missing", &update)
            .await
            .unwrap()
            .is_none());
    }
}
