//! # Category Repository
//!
//! Categories are created on first use by name within a channel and are
//! never deleted. `UNIQUE(name, channel)` makes creation an idempotent
//! upsert:
//!
//! ```text
//! INSERT … ON CONFLICT(name, channel) DO NOTHING
//!        │
//!        ▼
//! SELECT … WHERE name = ? AND channel = ?   → the existing or new row
//! ```
//!
//! Enumeration order is creation order (`rowid`). The statistics report
//! relies on it for its first-match tie-break.

use chrono::Utc;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use salon_core::{Category, Channel};

#[derive(Debug, FromRow)]
pub(crate) struct CategoryRow {
    pub id: String,
    pub name: String,
    pub channel: Channel,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            channel: row.channel,
        }
    }
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Category names for a channel, in creation order.
    pub async fn names(&self, channel: Channel) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM categories
            WHERE channel = ?1
            ORDER BY rowid
            "#,
        )
        .bind(channel)
        .fetch_all(&self.pool)
        .await?;

        debug!(channel = %channel, count = names.len(), "Loaded category universe");
        Ok(names)
    }
}

/// Returns the category with `name` in `channel`, creating it if needed.
/// Runs on the caller's connection so product writes stay in one transaction.
pub(crate) async fn upsert_category(
    conn: &mut SqliteConnection,
    name: &str,
    channel: Channel,
) -> DbResult<Category> {
    let name = name.trim();

    sqlx::query(
        r#"
        INSERT INTO categories (id, name, channel, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (name, channel) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(channel)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let row: CategoryRow = sqlx::query_as(
        r#"
        SELECT id, name, channel
        FROM categories
        WHERE name = ?1 AND channel = ?2
        "#,
    )
    .bind(name)
    .bind(channel)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}
