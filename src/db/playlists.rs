use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{
    db::models::{PlaylistEntryRow, PlaylistRow, PlaylistTrackRow},
    error::{AppError, Result},
};

const PLAYLIST_COLUMNS: &str = "id, user_id, name, description, created_at, updated_at";

/// Playlists and their ordered track entries.
///
/// Ownership is checked with [`PlaylistRepository::find_owned`]; the other
/// methods take an id the caller already verified.
///
/// # Example
///
/// ```rust,ignore
/// let playlists = PlaylistRepository::new(pool.clone());
/// let playlist = playlists.insert(user_id, "Road trip", None).await?;
/// let next = playlists.max_position(playlist.id).await?.unwrap_or(0) + 1;
/// playlists.add_track(playlist.id, track.id, next).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PlaylistRepository {
    pool: SqlitePool,
}

impl PlaylistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a playlist for `user_id`.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owner
    /// * `name` - Already trimmed, non-empty name
    /// * `description` - Optional free text
    ///
    /// # Returns
    ///
    /// The stored row. `created_at` and `updated_at` are equal on creation.
    pub async fn insert(
        &self,
        user_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<PlaylistRow> {
        let now = Utc::now();
        let id = query(
            "INSERT INTO playlists (user_id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(PlaylistRow {
            id,
            user_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    /// The playlist, if it exists and belongs to `user_id`.
    pub async fn find_owned(&self, id: i64, user_id: i64) -> Result<Option<PlaylistRow>> {
        let row = query_as::<_, PlaylistRow>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Playlists of `user_id`, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<PlaylistRow>> {
        let rows = query_as::<_, PlaylistRow>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Applies the given fields; `None` keeps the stored value.
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        query(
            r#"
            UPDATE playlists
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Deletes the playlist; its entries go with it through the foreign key cascade.
    pub async fn delete(&self, id: i64) -> Result<()> {
        query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Entries ordered by position.
    pub async fn entries(&self, playlist_id: i64) -> Result<Vec<PlaylistEntryRow>> {
        let rows = query_as::<_, PlaylistEntryRow>(
            r#"
            SELECT pt.playlist_id, pt.track_id, pt.position, t.external_id, t.external_provider,
                   t.title, t.artist, t.album, t.cover_url
            FROM playlist_tracks pt
            JOIN tracks t ON t.id = pt.track_id
            WHERE pt.playlist_id = ?
            ORDER BY pt.position ASC, pt.track_id ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Highest position in use, `None` for an empty playlist.
    pub async fn max_position(&self, playlist_id: i64) -> Result<Option<i64>> {
        let (max,): (Option<i64>,) =
            query_as("SELECT MAX(position) FROM playlist_tracks WHERE playlist_id = ?")
                .bind(playlist_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(max)
    }

    /// `Conflict` when the track is already in the playlist.
    pub async fn add_track(
        &self,
        playlist_id: i64,
        track_id: i64,
        position: i64,
    ) -> Result<PlaylistTrackRow> {
        query("INSERT INTO playlist_tracks (playlist_id, track_id, position) VALUES (?, ?, ?)")
            .bind(playlist_id)
            .bind(track_id)
            .bind(position)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "track already in playlist"))?;

        Ok(PlaylistTrackRow {
            playlist_id,
            track_id,
            position,
        })
    }

    /// Returns `false` when the track was not in the playlist.
    pub async fn remove_track(&self, playlist_id: i64, track_id: i64) -> Result<bool> {
        let result = query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND track_id = ?")
            .bind(playlist_id)
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
