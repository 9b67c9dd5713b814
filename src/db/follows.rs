use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{
    db::models::{FollowEntryRow, FollowRow, FollowTarget},
    error::{AppError, Result},
};

/// Follows of users and artists.
#[derive(Debug, Clone)]
pub struct FollowRepository {
    pool: SqlitePool,
}

impl FollowRepository {
    /// Creates a repository backed by `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `Conflict` when the same target is already followed.
    pub async fn insert(
        &self,
        follower_id: i64,
        target: FollowTarget,
        target_id: i64,
    ) -> Result<FollowRow> {
        let now = Utc::now();
        let id = query(
            "INSERT INTO follows (follower_id, target_type, target_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(follower_id)
        .bind(target.as_str())
        .bind(target_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "target already followed"))?
        .last_insert_rowid();

        Ok(FollowRow {
            id,
            follower_id,
            target_type: target.as_str().to_string(),
            target_id,
            created_at: now,
        })
    }

    /// Deletes a follow owned by `follower_id`.
    ///
    /// # Arguments
    ///
    /// * `follower_id` - User who created the follow
    /// * `follow_id` - Id of the follow row
    ///
    /// # Returns
    ///
    /// `true` when a row was removed, `false` when it does not exist or belongs
    /// to someone else.
    pub async fn delete(&self, follower_id: i64, follow_id: i64) -> Result<bool> {
        let result = query("DELETE FROM follows WHERE id = ? AND follower_id = ?")
            .bind(follow_id)
            .bind(follower_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Follows of `follower_id`, newest first. User targets carry the
    /// followed user's profile columns; artist targets leave them `NULL`.
    pub async fn list_by_follower(&self, follower_id: i64) -> Result<Vec<FollowEntryRow>> {
        let rows = query_as::<_, FollowEntryRow>(
            r#"
            SELECT f.id, f.follower_id, f.target_type, f.target_id, f.created_at,
                   u.name AS user_name, u.email AS user_email, u.created_at AS user_created_at
            FROM follows f
            LEFT JOIN users u ON f.target_type = 'user' AND u.id = f.target_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
