//! Upstream wire payloads.
//!
//! These mirror the JSON returned by the Spotify Web API and the Deezer
//! public API. Only the fields the service reads are declared; everything
//! else is ignored during deserialization. Catalog items are transient and
//! never stored as-is.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

/// Full or simplified Spotify artist object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub followers: Option<Followers>,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub href: Option<String>,
}

/// Full or simplified Spotify album object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: Option<String>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub href: Option<String>,
}

/// Spotify track object. Album track listings omit `album`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
    pub track_number: Option<u32>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub href: Option<String>,
}

/// Spotify paging envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<Paging<Track>>,
    pub artists: Option<Paging<Artist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopTracksResponse {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeezerArtist {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeezerAlbum {
    pub id: u64,
    pub title: String,
    pub cover_medium: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeezerTrack {
    pub id: u64,
    pub title: String,
    pub link: String,
    pub duration: Option<u64>,
    pub artist: DeezerArtist,
    pub album: DeezerAlbum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerSearchResponse {
    #[serde(default)]
    pub data: Vec<DeezerTrack>,
}

/// Deezer answers 200 with an `error` object for unknown ids.
#[derive(Debug, Clone, Deserialize)]
pub struct DeezerErrorResponse {
    pub error: DeezerErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerErrorDetail {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
    pub code: Option<u32>,
}
