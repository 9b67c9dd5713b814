use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{
    db::models::{ExternalProvider, NewTrack, TrackRow},
    error::Result,
};

const TRACK_COLUMNS: &str = "id, external_id, external_provider, title, artist, album, cover_url, created_at, updated_at";

/// Local copies of catalog tracks, unique per `(external_id, provider)`.
#[derive(Debug, Clone)]
pub struct TrackRepository {
    pool: SqlitePool,
}

impl TrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Finds a stored track by its catalog reference.
    ///
    /// # Arguments
    ///
    /// * `external_id` - Id on the provider's side
    /// * `provider` - Catalog the id belongs to
    ///
    /// # Returns
    ///
    /// `None` when the track was never stored for that provider.
    pub async fn find_by_external(
        &self,
        external_id: &str,
        provider: ExternalProvider,
    ) -> Result<Option<TrackRow>> {
        let track = query_as::<_, TrackRow>(&format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE external_id = ? AND external_provider = ?"
        ))
        .bind(external_id)
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    /// Inserts the track, or refreshes its summary fields if the
    /// `(external_id, provider)` pair is already stored.
    pub async fn upsert(&self, track: &NewTrack) -> Result<TrackRow> {
        let now = Utc::now();
        query(
            r#"
            INSERT INTO tracks (external_id, external_provider, title, artist, album, cover_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (external_id, external_provider) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                album = excluded.album,
                cover_url = excluded.cover_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&track.external_id)
        .bind(track.provider.as_str())
        .bind(&track.title)
        .bind(&track.artist)
        .bind(&track.album)
        .bind(&track.cover_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = query_as::<_, TrackRow>(&format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE external_id = ? AND external_provider = ?"
        ))
        .bind(&track.external_id)
        .bind(track.provider.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn blinding_lights(album: &str) -> NewTrack {
        NewTrack {
            external_id: "0VjIjW4GlUZAMYd2vXMi3b".into(),
            provider: ExternalProvider::Spotify,
            title: "Blinding Lights".into(),
            artist: Some("The Weeknd".into()),
            album: Some(album.into()),
            cover_url: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_refreshes_fields() {
        let repo = TrackRepository::new(create_test_pool().await.unwrap());

        let first = repo.upsert(&blinding_lights("After Hours")).await.unwrap();
        let second = repo
            .upsert(&blinding_lights("After Hours (Deluxe)"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.album.as_deref(), Some("After Hours (Deluxe)"));
    }

    #[tokio::test]
    async fn test_same_external_id_on_other_provider_is_a_new_row() {
        let repo = TrackRepository::new(create_test_pool().await.unwrap());

        let spotify = repo.upsert(&blinding_lights("After Hours")).await.unwrap();
        let deezer = repo
            .upsert(&NewTrack {
                provider: ExternalProvider::Deezer,
                ..blinding_lights("After Hours")
            })
            .await
            .unwrap();

        assert_ne!(spotify.id, deezer.id);
        assert!(
            repo.find_by_external("0VjIjW4GlUZAMYd2vXMi3b", ExternalProvider::Deezer)
                .await
                .unwrap()
                .is_some()
        );
    }
}
