use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        PlaylistRepository,
        models::{ExternalProvider, PlaylistEntryRow, PlaylistRow, PlaylistTrackRow},
    },
    error::{AppError, Result},
    management::resolver::TrackResolver,
};

/// Highest position a playlist entry may take.
pub const MAX_POSITION: i64 = 1_000_000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlaylist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlaylist {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrack {
    pub external_id: String,
    pub external_provider: ExternalProvider,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDto {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlaylistRow> for PlaylistDto {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    pub playlist_id: i64,
    pub track_id: i64,
    pub position: i64,
}

impl From<PlaylistTrackRow> for PlaylistTrack {
    fn from(row: PlaylistTrackRow) -> Self {
        Self {
            playlist_id: row.playlist_id,
            track_id: row.track_id,
            position: row.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTrack {
    pub id: i64,
    pub external_id: String,
    pub external_provider: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub playlist_id: i64,
    pub track_id: i64,
    pub position: i64,
    pub track: StoredTrack,
}

impl From<PlaylistEntryRow> for PlaylistEntry {
    fn from(row: PlaylistEntryRow) -> Self {
        Self {
            playlist_id: row.playlist_id,
            track_id: row.track_id,
            position: row.position,
            track: StoredTrack {
                id: row.track_id,
                external_id: row.external_id,
                external_provider: row.external_provider,
                title: row.title,
                artist: row.artist,
                album: row.album,
                cover_url: row.cover_url,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: PlaylistDto,
    pub tracks: Vec<PlaylistEntry>,
}

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    Ok(name)
}

/// Playlists are private: every operation is scoped to the owner and a
/// playlist of someone else looks exactly like a missing one.
/// Private playlists.
///
/// A playlist is only visible to its owner. Every other user gets `NotFound`
/// so that ids of other people's playlists are not confirmed.
///
/// # Example
///
/// ```rust,ignore
/// let playlist = playlists.create(user_id, &CreatePlaylist {
///     name: "Road trip".into(),
///     description: None,
/// }).await?;
/// playlists.add_track(playlist.id, user_id, &AddTrack {
///     external_id: "0VjIjW4GlUZAMYd2vXMi3b".into(),
///     external_provider: ExternalProvider::Spotify,
///     position: None,
/// }).await?;
/// ```
#[derive(Clone)]
pub struct PlaylistsManager {
    resolver: TrackResolver,
    playlists: PlaylistRepository,
}

impl PlaylistsManager {
    pub fn new(resolver: TrackResolver, playlists: PlaylistRepository) -> Self {
        Self {
            resolver,
            playlists,
        }
    }

    /// Creates an empty playlist.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owner
    /// * `request` - Name (trimmed, must not be blank) and optional description
    ///
    /// # Returns
    ///
    /// The new playlist, or `Validation` for a blank name.
    pub async fn create(&self, user_id: i64, request: &CreatePlaylist) -> Result<PlaylistDto> {
        let name = required_name(&request.name)?;
        let row = self
            .playlists
            .insert(user_id, name, request.description.as_deref())
            .await?;
        Ok(row.into())
    }

    /// Playlists of `user_id`, newest first, without their tracks.
    pub async fn list(&self, user_id: i64) -> Result<Vec<PlaylistDto>> {
        let rows = self.playlists.list_by_user(user_id).await?;
        Ok(rows.into_iter().map(PlaylistDto::from).collect())
    }

    /// The playlist with its entries in position order.
    pub async fn get(&self, id: i64, user_id: i64) -> Result<PlaylistDetail> {
        let playlist = self.owned(id, user_id).await?;
        let entries = self.playlists.entries(id).await?;
        Ok(PlaylistDetail {
            playlist: playlist.into(),
            tracks: entries.into_iter().map(PlaylistEntry::from).collect(),
        })
    }

    /// Partial update; fields left out keep their value. A blank name is a `Validation` error.
    pub async fn update(&self, id: i64, user_id: i64, request: &UpdatePlaylist) -> Result<PlaylistDto> {
        self.owned(id, user_id).await?;
        let name = request.name.as_deref().map(required_name).transpose()?;
        self.playlists
            .update(id, name, request.description.as_deref())
            .await?;
        Ok(self.owned(id, user_id).await?.into())
    }

    /// Deletes the playlist and all of its entries.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<()> {
        self.owned(id, user_id).await?;
        self.playlists.delete(id).await
    }

    /// Stores the track locally on first use. Without an explicit position
    /// the track is appended after the current last one.
    ///
    /// # Arguments
    ///
    /// * `playlist_id` - Playlist owned by `user_id`
    /// * `user_id` - Signed-in user
    /// * `request` - Track reference and optional 1-based position
    ///
    /// # Returns
    ///
    /// The stored entry. `Validation` for a blank id or a position outside
    /// `1..=MAX_POSITION`, `NotFound` for someone else's playlist and
    /// `Conflict` when the track is already in it.
    pub async fn add_track(
        &self,
        playlist_id: i64,
        user_id: i64,
        request: &AddTrack,
    ) -> Result<PlaylistTrack> {
        self.owned(playlist_id, user_id).await?;

        let external_id = request.external_id.trim();
        if external_id.is_empty() {
            return Err(AppError::Validation("externalId must not be empty".into()));
        }
        if let Some(position) = request.position {
            check_position(position)?;
        }
        let track = self
            .resolver
            .ensure(external_id, request.external_provider)
            .await?;

        let position = match request.position {
            Some(position) => position,
            None => next_position(self.playlists.max_position(playlist_id).await?)?,
        };
        let row = self
            .playlists
            .add_track(playlist_id, track.id, position)
            .await?;
        Ok(row.into())
    }

    /// `NotFound` when the playlist is not the user's or the track is not in it.
    pub async fn remove_track(&self, playlist_id: i64, user_id: i64, track_id: i64) -> Result<()> {
        self.owned(playlist_id, user_id).await?;
        if self.playlists.remove_track(playlist_id, track_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("track not in playlist".into()))
        }
    }

    async fn owned(&self, id: i64, user_id: i64) -> Result<PlaylistRow> {
        self.playlists
            .find_owned(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("playlist {id} not found")))
    }
}

fn check_position(position: i64) -> Result<i64> {
    if (1..=MAX_POSITION).contains(&position) {
        Ok(position)
    } else {
        Err(AppError::Validation(format!(
            "position must be between 1 and {MAX_POSITION}"
        )))
    }
}

/// Position after the current last entry.
fn next_position(last: Option<i64>) -> Result<i64> {
    last.unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| AppError::Validation("playlist has no free position left".into()))
        .and_then(check_position)
}
