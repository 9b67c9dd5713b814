use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{
    db::models::FavoriteRow,
    error::{AppError, Result},
};

const FAVORITE_SELECT: &str = r#"
    SELECT f.id, f.user_id, f.track_id, t.external_id, t.title, t.artist, t.album, t.cover_url, f.created_at
    FROM favorites f
    JOIN tracks t ON t.id = f.track_id
"#;

/// Favorited tracks per user, read back joined with the track summary.
///
/// # Example
///
/// ```rust,ignore
/// let favorites = FavoriteRepository::new(pool.clone());
/// let row = favorites.insert(user_id, track.id).await?;
/// assert_eq!(row.external_id, track.external_id);
/// ```
#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `Conflict` if the user already favorited the track.
    pub async fn insert(&self, user_id: i64, track_id: i64) -> Result<FavoriteRow> {
        let id = query("INSERT INTO favorites (user_id, track_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(track_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "track already favorited"))?
            .last_insert_rowid();

        let row = query_as::<_, FavoriteRow>(&format!("{FAVORITE_SELECT} WHERE f.id = ?"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Returns `false` when there was nothing to delete.
    pub async fn delete(&self, user_id: i64, track_id: i64) -> Result<bool> {
        let result = query("DELETE FROM favorites WHERE user_id = ? AND track_id = ?")
            .bind(user_id)
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<FavoriteRow>> {
        let rows = query_as::<_, FavoriteRow>(&format!(
            "{FAVORITE_SELECT} WHERE f.user_id = ? ORDER BY f.created_at DESC, f.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of tracks `user_id` has favorited.
    pub async fn count_by_user(&self, user_id: i64) -> Result<i64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM favorites WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
