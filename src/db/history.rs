use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{db::models::SearchHistoryRow, error::Result};

/// Queries a user searched for while signed in.
#[derive(Debug, Clone)]
pub struct SearchHistoryRepository {
    pool: SqlitePool,
}

impl SearchHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records one search.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Signed-in user who searched
    /// * `search` - Query text as typed
    ///
    /// # Returns
    ///
    /// The stored row with its new id and timestamp.
    pub async fn insert(&self, user_id: i64, search: &str) -> Result<SearchHistoryRow> {
        let now = Utc::now();
        let id = query("INSERT INTO search_history (user_id, query, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(search)
            .bind(now)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(SearchHistoryRow {
            id,
            user_id,
            query: search.to_string(),
            created_at: now,
        })
    }

    /// Newest first, `limit` rows starting at `offset`.
    pub async fn list(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<SearchHistoryRow>> {
        let rows = query_as::<_, SearchHistoryRow>(
            r#"
            SELECT id, user_id, query, created_at
            FROM search_history
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// `false` when the entry does not exist or is someone else's.
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = query("DELETE FROM search_history WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of removed entries.
    pub async fn clear(&self, user_id: i64) -> Result<u64> {
        let result = query("DELETE FROM search_history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
