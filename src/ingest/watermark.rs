//! Timestamp of the last feed scrape.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::DbPool;
use crate::{Result, SkratimeError};

/// Key of the single watermark record.
pub const WATERMARK_KEY: &str = "last_scrape";

/// Repository for the scrape watermark.
pub struct WatermarkRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> WatermarkRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Read the watermark. Unparseable values are treated as absent.
    pub async fn get(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT last_scrape FROM scrape_watermark WHERE key = $1")
                .bind(WATERMARK_KEY)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(raw.and_then(|value| match DateTime::parse_from_rfc3339(&value) {
            Ok(t) => Some(t.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(value = %value, "Ignoring unparseable watermark: {}", e);
                None
            }
        }))
    }

    /// Overwrite the watermark.
    pub async fn set(&self, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO scrape_watermark (key, last_scrape, updated_at)
             VALUES ($1, $2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                 last_scrape = excluded.last_scrape,
                 updated_at = excluded.updated_at",
        )
        .bind(WATERMARK_KEY)
        .bind(at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(self.pool)
        .await
        .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(())
    }
}
