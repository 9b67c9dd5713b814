use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{db::models::ReviewRow, error::Result};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.name AS user_name, r.track_id, t.external_id, t.title, t.artist,
           t.album, t.cover_url, r.rating, r.comment, r.created_at
    FROM reviews r
    JOIN tracks t ON t.id = r.track_id
    JOIN users u ON u.id = r.user_id
"#;

/// Ratings with optional comments. Rows are read joined with the track and author.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a review.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Author
    /// * `track_id` - Local track id
    /// * `rating` - Already validated to be within `1..=5`
    /// * `comment` - Optional text
    ///
    /// # Returns
    ///
    /// The review joined with its track summary and author name.
    pub async fn insert(
        &self,
        user_id: i64,
        track_id: i64,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<ReviewRow> {
        let now = Utc::now();
        let id = query(
            "INSERT INTO reviews (user_id, track_id, rating, comment, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(track_id)
        .bind(rating)
        .bind(comment)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let row = query_as::<_, ReviewRow>(&format!("{REVIEW_SELECT} WHERE r.id = ?"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Deletes only when the review belongs to `user_id`.
    pub async fn delete(&self, user_id: i64, review_id: i64) -> Result<bool> {
        let result = query("DELETE FROM reviews WHERE id = ? AND user_id = ?")
            .bind(review_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reviews written by `user_id`, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<ReviewRow>> {
        let rows = query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.user_id = ? ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Reviews of one local track, newest first.
    pub async fn list_by_track(&self, track_id: i64) -> Result<Vec<ReviewRow>> {
        let rows = query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.track_id = ? ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(track_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Latest reviews across all users.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ReviewRow>> {
        let rows = query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} ORDER BY r.created_at DESC, r.id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Rated 4 or better with a comment; best first, then newest.
    pub async fn list_featured(&self, limit: i64) -> Result<Vec<ReviewRow>> {
        let rows = query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.rating >= 4 AND r.comment IS NOT NULL \
             ORDER BY r.rating DESC, r.created_at DESC, r.id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
