use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        FavoriteRepository,
        models::{ExternalProvider, FavoriteRow},
    },
    error::{AppError, Result},
    management::resolver::TrackResolver,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavorite {
    pub external_id: String,
    pub external_provider: ExternalProvider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteDto {
    pub id: i64,
    pub track_id: i64,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for FavoriteDto {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: row.id,
            track_id: row.track_id,
            external_id: row.external_id,
            title: row.title,
            artist: row.artist,
            album: row.album,
            cover_url: row.cover_url,
            created_at: row.created_at,
        }
    }
}

/// Favorite tracks of signed-in users.
#[derive(Clone)]
pub struct FavoritesManager {
    resolver: TrackResolver,
    favorites: FavoriteRepository,
}

impl FavoritesManager {
    pub fn new(resolver: TrackResolver, favorites: FavoriteRepository) -> Self {
        Self {
            resolver,
            favorites,
        }
    }

    /// Refreshes the local track from its provider, then favorites it.
    /// Favoriting the same track twice is a `Conflict`.
    pub async fn add(&self, user_id: i64, request: &CreateFavorite) -> Result<FavoriteDto> {
        let external_id = request.external_id.trim();
        if external_id.is_empty() {
            return Err(AppError::Validation("externalId must not be empty".into()));
        }

        let track = self
            .resolver
            .refresh(external_id, request.external_provider)
            .await?;
        let row = self.favorites.insert(user_id, track.id).await?;
        Ok(row.into())
    }

    /// Unfavorites a track.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Signed-in user
    /// * `track_id` - Local track id, as returned in [`FavoriteDto::track_id`]
    ///
    /// # Returns
    ///
    /// `NotFound` when the user never favorited the track.
    pub async fn remove(&self, user_id: i64, track_id: i64) -> Result<()> {
        if self.favorites.delete(user_id, track_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("favorite not found".into()))
        }
    }

    /// Favorites of `user_id`, newest first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<FavoriteDto>> {
        let rows = self.favorites.list_by_user(user_id).await?;
        Ok(rows.into_iter().map(FavoriteDto::from).collect())
    }
}
