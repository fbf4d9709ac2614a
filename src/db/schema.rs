//! Database schema and migrations for Skratime.
//!
//! Migrations are applied in order when the database is opened.
//! The schema_version table tracks which migrations have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Identity store
    r#"
CREATE TABLE users (
    id                  TEXT PRIMARY KEY,       -- UUID subject
    email               TEXT NOT NULL,
    password            TEXT NOT NULL,          -- Argon2 hash
    full_name           TEXT NOT NULL DEFAULT '',
    email_verified      INTEGER NOT NULL DEFAULT 1,
    enabled             INTEGER NOT NULL DEFAULT 1,
    user_status         TEXT NOT NULL DEFAULT 'CONFIRMED',
    notion_link         TEXT NOT NULL DEFAULT '',
    user_interests      TEXT NOT NULL DEFAULT '[]',     -- JSON-encoded list
    personal_categories TEXT NOT NULL DEFAULT '[]',     -- JSON-encoded list
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    last_login          TEXT
);

CREATE UNIQUE INDEX idx_users_email_nocase ON users(email COLLATE NOCASE);

CREATE TABLE refresh_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token       TEXT NOT NULL UNIQUE,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    revoked_at  TEXT
);

CREATE INDEX idx_refresh_tokens_user_id ON refresh_tokens(user_id);
"#,
    // v2: Categories
    r#"
CREATE TABLE categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX idx_categories_name_nocase ON categories(name COLLATE NOCASE);
"#,
    // v3: News items
    r#"
CREATE TABLE news_items (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    summary      TEXT NOT NULL,
    category_id  TEXT NOT NULL DEFAULT 'uncategorized',  -- category id or sentinel
    picture_url  TEXT NOT NULL DEFAULT '',
    news_link    TEXT NOT NULL DEFAULT '',
    published_at TEXT,                                   -- RFC 3339, UTC
    author       TEXT NOT NULL DEFAULT '',
    full_article TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_news_items_category ON news_items(category_id, id);
CREATE INDEX idx_news_items_published ON news_items(published_at);
"#,
    // v4: Bookmarks (no foreign key: rows may outlive their news item)
    r#"
CREATE TABLE bookmarks (
    user_id     TEXT NOT NULL,
    news_id     TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, news_id)
);
"#,
    // v5: Scrape watermark
    r#"
CREATE TABLE scrape_watermark (
    key         TEXT PRIMARY KEY,
    last_scrape TEXT NOT NULL,   -- RFC 3339, UTC
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v6: Message queue
    r#"
CREATE TABLE queue_messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    queue           TEXT NOT NULL,
    body            TEXT NOT NULL,
    receive_count   INTEGER NOT NULL DEFAULT 0,
    visible_at      INTEGER NOT NULL,   -- unix seconds
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_queue_messages_visible ON queue_messages(queue, visible_at, id);
"#,
    // v7: Unicode-folded category name key (written by the application)
    r#"
ALTER TABLE categories ADD COLUMN name_key TEXT NOT NULL DEFAULT '';
UPDATE categories SET name_key = lower(trim(name));
DROP INDEX idx_categories_name_nocase;
CREATE UNIQUE INDEX idx_categories_name_key ON categories(name_key);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_category_name_is_unique_case_insensitive() {
        let categories = MIGRATIONS[1];
        assert!(categories.contains("CREATE TABLE categories"));
        assert!(categories.contains("UNIQUE INDEX idx_categories_name_nocase"));
        assert!(categories.contains("COLLATE NOCASE"));
    }

    #[test]
    fn test_category_name_key_replaces_nocase_index() {
        let name_key = MIGRATIONS[6];
        assert!(name_key.contains("ADD COLUMN name_key"));
        assert!(name_key.contains("DROP INDEX idx_categories_name_nocase"));
        assert!(name_key.contains("UNIQUE INDEX idx_categories_name_key ON categories(name_key)"));
    }

    #[test]
    fn test_bookmarks_composite_key() {
        let bookmarks = MIGRATIONS[3];
        assert!(bookmarks.contains("PRIMARY KEY (user_id, news_id)"));
        assert!(!bookmarks.contains("REFERENCES"));
    }

    #[test]
    fn test_watermark_single_key_table() {
        let watermark = MIGRATIONS[4];
        assert!(watermark.contains("CREATE TABLE scrape_watermark"));
        assert!(watermark.contains("key         TEXT PRIMARY KEY"));
    }
}
