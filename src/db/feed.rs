use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, query_as};

use crate::{
    db::models::{FavoriteActivityRow, PlatformCounts, PlaylistActivityRow, TrendingTrackRow},
    error::Result,
};

/// Read-only aggregate queries behind the public feed.
#[derive(Debug, Clone)]
pub struct FeedRepository {
    pool: SqlitePool,
}

impl FeedRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Latest favorites across all users, with who favorited what.
    pub async fn recent_favorites(&self, limit: i64) -> Result<Vec<FavoriteActivityRow>> {
        let rows = query_as::<_, FavoriteActivityRow>(
            r#"
            SELECT f.id, f.user_id, u.name AS user_name, f.track_id, t.external_id, t.title,
                   t.artist, t.album, t.cover_url, f.created_at
            FROM favorites f
            JOIN users u ON u.id = f.user_id
            JOIN tracks t ON t.id = f.track_id
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Latest playlists across all users.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of rows
    ///
    /// # Returns
    ///
    /// Rows newest first, each with the owner's name and the playlist's current
    /// track count.
    pub async fn recent_playlists(&self, limit: i64) -> Result<Vec<PlaylistActivityRow>> {
        let rows = query_as::<_, PlaylistActivityRow>(
            r#"
            SELECT p.id, p.user_id, u.name AS user_name, p.name, p.description,
                   (SELECT COUNT(*) FROM playlist_tracks pt WHERE pt.playlist_id = p.id) AS track_count,
                   p.created_at
            FROM playlists p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Totals plus the number of tracks with at least three reviews and the
    /// number of users who reviewed anything, each capped at five.
    pub async fn counts(&self) -> Result<PlatformCounts> {
        let (users, reviews, favorites, playlists, top_rated_tracks, most_active_users): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM reviews),
                (SELECT COUNT(*) FROM favorites),
                (SELECT COUNT(*) FROM playlists),
                (SELECT COUNT(*) FROM (
                    SELECT track_id FROM reviews GROUP BY track_id HAVING COUNT(*) >= 3 LIMIT 5
                )),
                (SELECT COUNT(*) FROM (
                    SELECT user_id FROM reviews GROUP BY user_id LIMIT 5
                ))
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PlatformCounts {
            users,
            reviews,
            favorites,
            playlists,
            top_rated_tracks,
            most_active_users,
        })
    }

    /// Tracks favorited or reviewed since `since`, busiest first, with their
    /// all-time counts.
    pub async fn trending(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<TrendingTrackRow>> {
        let rows = query_as::<_, TrendingTrackRow>(
            r#"
            WITH recent AS (
                SELECT track_id FROM favorites WHERE created_at >= ?1
                UNION ALL
                SELECT track_id FROM reviews WHERE created_at >= ?1
            ),
            ranked AS (
                SELECT track_id, COUNT(*) AS activity
                FROM recent
                GROUP BY track_id
                ORDER BY activity DESC, track_id ASC
                LIMIT ?2
            )
            SELECT t.id, t.external_id, t.external_provider, t.title, t.artist, t.album, t.cover_url,
                   (SELECT COUNT(*) FROM favorites f WHERE f.track_id = t.id) AS favorites_count,
                   (SELECT COUNT(*) FROM reviews r WHERE r.track_id = t.id) AS reviews_count,
                   t.created_at, t.updated_at
            FROM ranked
            JOIN tracks t ON t.id = ranked.track_id
            ORDER BY ranked.activity DESC, t.id ASC
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
