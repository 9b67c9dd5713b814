//! Row types returned by the repositories.
//!
//! Joined rows alias their columns explicitly in SQL so the field names here
//! are the whole contract.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Catalog a local track was copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalProvider {
    Spotify,
    Deezer,
}

impl ExternalProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalProvider::Spotify => "Spotify",
            ExternalProvider::Deezer => "Deezer",
        }
    }
}

impl fmt::Display for ExternalProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExternalProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Spotify" => Ok(ExternalProvider::Spotify),
            "Deezer" => Ok(ExternalProvider::Deezer),
            other => Err(AppError::Validation(format!(
                "unknown external provider '{other}'"
            ))),
        }
    }
}

/// What a follow points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowTarget {
    User,
    Artist,
}

impl FollowTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowTarget::User => "user",
            FollowTarget::Artist => "artist",
        }
    }
}

impl FromStr for FollowTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(FollowTarget::User),
            "artist" => Ok(FollowTarget::Artist),
            other => Err(AppError::Validation(format!(
                "unknown follow target '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TrackRow {
    pub id: i64,
    pub external_id: String,
    pub external_provider: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary fields copied from a catalog track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub external_id: String,
    pub provider: ExternalProvider,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
}

/// A favorite joined with its track.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FavoriteRow {
    pub id: i64,
    pub user_id: i64,
    pub track_id: i64,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A review joined with its track and author.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub track_id: i64,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FollowRow {
    pub id: i64,
    pub follower_id: i64,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A follow with the followed user's profile when the target is a user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FollowEntryRow {
    pub id: i64,
    pub follower_id: i64,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PlaylistRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PlaylistTrackRow {
    pub playlist_id: i64,
    pub track_id: i64,
    pub position: i64,
}

/// A playlist entry joined with its track.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PlaylistEntryRow {
    pub playlist_id: i64,
    pub track_id: i64,
    pub position: i64,
    pub external_id: String,
    pub external_provider: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SearchHistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// A recent favorite with the name of the user who made it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FavoriteActivityRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub track_id: i64,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recent playlist with its owner's name and track count.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PlaylistActivityRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub name: String,
    pub description: Option<String>,
    pub track_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A track with its all-time favorite and review counts.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TrendingTrackRow {
    pub id: i64,
    pub external_id: String,
    pub external_provider: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub favorites_count: i64,
    pub reviews_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCounts {
    pub users: i64,
    pub reviews: i64,
    pub favorites: i64,
    pub playlists: i64,
    pub top_rated_tracks: i64,
    pub most_active_users: i64,
}
