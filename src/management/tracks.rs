use std::sync::Arc;

use serde::Serialize;

use crate::{
    deezer::DeezerClient,
    error::{AppError, Result},
    pagination::{CursorPage, PageWindow, paginate},
    spotify::Catalog,
    types::{Album, DeezerTrack, Image, Track},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: String,
    pub title: String,
    pub artist_names: Vec<String>,
    pub album_name: String,
    pub duration_ms: u64,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetail {
    pub id: String,
    pub title: String,
    pub artist_names: Vec<String>,
    pub album_name: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub popularity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDetail {
    pub id: String,
    pub name: String,
    pub release_date: Option<String>,
    pub total_tracks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub artist_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumTrack {
    pub id: String,
    pub title: String,
    pub track_number: Option<u32>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub artist_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeezerTrackSummary {
    pub id: u64,
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub embed_url: String,
}

pub(crate) fn artist_names(track: &Track) -> Vec<String> {
    track.artists.iter().map(|a| a.name.clone()).collect()
}

pub(crate) fn first_image(images: &[Image]) -> Option<String> {
    images.first().map(|image| image.url.clone())
}

fn album_image(album: Option<&Album>) -> Option<String> {
    album.and_then(|album| first_image(&album.images))
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.name.clone(),
            artist_names: artist_names(track),
            album_name: track
                .album
                .as_ref()
                .map(|album| album.name.clone())
                .unwrap_or_default(),
            duration_ms: track.duration_ms,
            href: track
                .external_urls
                .spotify
                .clone()
                .or_else(|| track.href.clone())
                .unwrap_or_default(),
        }
    }
}

impl From<&Track> for TrackDetail {
    fn from(track: &Track) -> Self {
        let summary = TrackSummary::from(track);
        Self {
            id: summary.id,
            title: summary.title,
            artist_names: summary.artist_names,
            album_name: summary.album_name,
            duration_ms: summary.duration_ms,
            preview_url: track.preview_url.clone(),
            popularity: track.popularity.unwrap_or_default(),
            image_url: album_image(track.album.as_ref()),
            href: summary.href,
        }
    }
}

impl From<&Album> for AlbumDetail {
    fn from(album: &Album) -> Self {
        Self {
            id: album.id.clone(),
            name: album.name.clone(),
            release_date: album.release_date.clone(),
            total_tracks: album.total_tracks.unwrap_or_default(),
            image_url: first_image(&album.images),
            artist_names: album.artists.iter().map(|a| a.name.clone()).collect(),
        }
    }
}

impl From<&Track> for AlbumTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.name.clone(),
            track_number: track.track_number,
            duration_ms: track.duration_ms,
            preview_url: track.preview_url.clone(),
            artist_names: artist_names(track),
        }
    }
}

impl From<&DeezerTrack> for DeezerTrackSummary {
    fn from(track: &DeezerTrack) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            artist: track.artist.name.clone(),
            cover_url: track.album.cover_medium.clone(),
            embed_url: track.link.clone(),
        }
    }
}

/// Rejects a missing or blank search query and returns it trimmed.
pub fn require_query(query: Option<&str>) -> Result<&str> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("query must not be empty".to_string()))
}

/// Track and album lookups against the catalog.
#[derive(Clone)]
pub struct TrackManager {
    catalog: Arc<dyn Catalog>,
    deezer: DeezerClient,
}

impl TrackManager {
    pub fn new(catalog: Arc<dyn Catalog>, deezer: DeezerClient) -> Self {
        Self { catalog, deezer }
    }

    /// Searches catalog tracks, one cursor page at a time.
    ///
    /// # Arguments
    ///
    /// * `query` - Free-text search, already checked to be non-blank
    /// * `window` - Offset cursor and page size
    ///
    /// # Returns
    ///
    /// The page of matches. `next_cursor` is `cursor + limit` when the catalog
    /// returned a full page and `None` otherwise.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let tracks = TrackManager::new(catalog, deezer);
    /// let first = tracks.search("blinding lights", PageWindow::default()).await?;
    /// if let Some(cursor) = first.next_cursor {
    ///     let window = PageWindow { cursor, ..PageWindow::default() };
    ///     let second = tracks.search("blinding lights", window).await?;
    /// }
    /// ```
    pub async fn search(&self, query: &str, window: PageWindow) -> Result<CursorPage<TrackSummary>> {
        let page = paginate(window, |limit, offset| {
            self.catalog.search_tracks(query, limit, offset)
        })
        .await?;
        Ok(page.map(|track| TrackSummary::from(&track)))
    }

    /// `NotFound` when the catalog has no track with this id.
    pub async fn detail(&self, id: &str) -> Result<TrackDetail> {
        let track = self.catalog.get_track(id).await?;
        Ok(TrackDetail::from(&track))
    }

    /// `NotFound` when the catalog has no album with this id.
    pub async fn album(&self, id: &str) -> Result<AlbumDetail> {
        let album = self.catalog.get_album(id).await?;
        Ok(AlbumDetail::from(&album))
    }

    pub async fn album_tracks(
        &self,
        album_id: &str,
        window: PageWindow,
    ) -> Result<CursorPage<AlbumTrack>> {
        let page = paginate(window, |limit, offset| {
            self.catalog.get_album_tracks(album_id, limit, offset)
        })
        .await?;
        Ok(page.map(|track| AlbumTrack::from(&track)))
    }

    /// Deezer's first page of matches for `query`.
    pub async fn deezer_search(&self, query: &str) -> Result<Vec<DeezerTrackSummary>> {
        let tracks = self.deezer.search_tracks(query).await?;
        Ok(tracks.iter().map(DeezerTrackSummary::from).collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::{Album, Artist, ExternalUrls, Image, Track};

    pub fn artist(id: &str, name: &str) -> Artist {
        Artist {
            id: id.into(),
            name: name.into(),
            genres: vec![],
            followers: None,
            popularity: None,
            images: vec![],
            external_urls: ExternalUrls::default(),
            href: None,
        }
    }

    pub fn album(id: &str, name: &str) -> Album {
        Album {
            id: id.into(),
            name: name.into(),
            album_type: Some("album".into()),
            release_date: Some("2020-03-20".into()),
            total_tracks: Some(14),
            images: vec![Image {
                url: format!("https://i.scdn.co/image/{id}"),
                width: Some(640),
                height: Some(640),
            }],
            artists: vec![artist("1Xyo4u8uXC1ZmMpatF05PJ", "The Weeknd")],
            external_urls: ExternalUrls::default(),
            href: None,
        }
    }

    pub fn track(id: &str, name: &str) -> Track {
        Track {
            id: id.into(),
            name: name.into(),
            artists: vec![artist("1Xyo4u8uXC1ZmMpatF05PJ", "The Weeknd")],
            album: Some(album("4yP0hdKOZPNshxUOjY0cZj", "After Hours")),
            duration_ms: 200_040,
            explicit: false,
            popularity: Some(91),
            preview_url: None,
            track_number: Some(9),
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/track/{id}")),
            },
            href: Some(format!("https://api.spotify.com/v1/tracks/{id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::{fixtures::track, *};
    use crate::spotify::{RetryPolicy, RetryingHttpClient, catalog::MockCatalog};

    fn manager(catalog: MockCatalog) -> TrackManager {
        let http = RetryingHttpClient::new(Client::new(), RetryPolicy::default());
        TrackManager::new(Arc::new(catalog), DeezerClient::new(http, "http://127.0.0.1:9"))
    }

    #[test]
    fn test_require_query_trims_and_rejects_blank() {
        assert_eq!(require_query(Some("  lofi beats ")).unwrap(), "lofi beats");
        assert!(matches!(require_query(Some("   ")), Err(AppError::Validation(_))));
        assert!(matches!(require_query(None), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_full_page_yields_next_cursor() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search_tracks()
            .withf(|q, limit, offset| q.to_string() == "blinding lights" && *limit == 1 && *offset == 0)
            .times(1)
            .returning(|_, _, _| Ok(vec![track("0VjIjW4GlUZAMYd2vXMi3b", "Blinding Lights")]));

        let page = manager(catalog)
            .search("blinding lights", PageWindow { cursor: 0, limit: 1 })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor, Some(1));
        let summary = &page.items[0];
        assert_eq!(summary.title, "Blinding Lights");
        assert_eq!(summary.artist_names, vec!["The Weeknd"]);
        assert_eq!(summary.album_name, "After Hours");
        assert_eq!(summary.duration_ms, 200_040);
    }

    #[tokio::test]
    async fn test_short_page_has_no_next_cursor() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search_tracks()
            .returning(|_, _, _| Ok(vec![track("a", "A"), track("b", "B")]));

        let page = manager(catalog)
            .search("x", PageWindow { cursor: 20, limit: 5 })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_detail_maps_album_image_and_popularity() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_track()
            .returning(|id| Ok(track(id, "Blinding Lights")));

        let detail = manager(catalog).detail("0VjIjW4GlUZAMYd2vXMi3b").await.unwrap();
        assert_eq!(detail.popularity, 91);
        assert_eq!(
            detail.image_url.as_deref(),
            Some("https://i.scdn.co/image/4yP0hdKOZPNshxUOjY0cZj")
        );
        assert_eq!(
            detail.href,
            "https://open.spotify.com/track/0VjIjW4GlUZAMYd2vXMi3b"
        );
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_track()
            .returning(|id| Err(AppError::NotFound(format!("track {id} not found"))));

        let err = manager(catalog).detail("unknown-id").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
