use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::Result,
    management::tracks::{TrackSummary, first_image},
    pagination::{CursorPage, PageWindow, paginate},
    spotify::Catalog,
    types::{Album, Artist},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistInfo {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub followers: u64,
    pub popularity: u32,
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub total_tracks: u32,
    pub release_date: Option<String>,
}

impl From<&Artist> for ArtistSummary {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id.clone(),
            name: artist.name.clone(),
            external_url: artist.external_urls.spotify.clone(),
            image_url: first_image(&artist.images),
        }
    }
}

impl From<&Artist> for ArtistInfo {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id.clone(),
            name: artist.name.clone(),
            genres: artist.genres.clone(),
            followers: artist.followers.as_ref().map_or(0, |f| f.total),
            popularity: artist.popularity.unwrap_or_default(),
            external_url: artist.external_urls.spotify.clone(),
            image_url: first_image(&artist.images),
        }
    }
}

impl From<&Album> for AlbumSummary {
    fn from(album: &Album) -> Self {
        Self {
            id: album.id.clone(),
            title: album.name.clone(),
            image_url: first_image(&album.images),
            total_tracks: album.total_tracks.unwrap_or_default(),
            release_date: album.release_date.clone(),
        }
    }
}

/// Artist lookups against the catalog.
/// Artist lookups against the catalog.
#[derive(Clone)]
pub struct ArtistManager {
    catalog: Arc<dyn Catalog>,
    market: String,
}

impl ArtistManager {
    pub fn new(catalog: Arc<dyn Catalog>, market: impl Into<String>) -> Self {
        Self {
            catalog,
            market: market.into(),
        }
    }

    /// Searches artists by name, one cursor page at a time.
    ///
    /// # Arguments
    ///
    /// * `query` - Free-text search, already checked to be non-blank
    /// * `window` - Offset cursor and page size
    ///
    /// # Returns
    ///
    /// The page of matches and the cursor of the next page, if any.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let page = artists.search("daft punk", PageWindow { cursor: 0, limit: 10 }).await?;
    /// for artist in &page.items {
    ///     println!("{} {}", artist.id, artist.name);
    /// }
    /// ```
    pub async fn search(&self, query: &str, window: PageWindow) -> Result<CursorPage<ArtistSummary>> {
        let page = paginate(window, |limit, offset| {
            self.catalog.search_artists(query, limit, offset)
        })
        .await?;
        Ok(page.map(|artist| ArtistSummary::from(&artist)))
    }

    /// `NotFound` when the catalog has no artist with this id.
    pub async fn info(&self, id: &str) -> Result<ArtistInfo> {
        let artist = self.catalog.get_artist(id).await?;
        Ok(ArtistInfo::from(&artist))
    }

    /// One window of the artist's albums, in catalog order.
    pub async fn albums(&self, id: &str, window: PageWindow) -> Result<Vec<AlbumSummary>> {
        let albums = self
            .catalog
            .get_artist_albums(id, window.limit, window.cursor)
            .await?;
        Ok(albums.iter().map(AlbumSummary::from).collect())
    }

    /// Top tracks in the configured market.
    pub async fn top_tracks(&self, id: &str) -> Result<Vec<TrackSummary>> {
        let tracks = self.catalog.get_artist_top_tracks(id, &self.market).await?;
        Ok(tracks.iter().map(TrackSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        management::tracks::fixtures::{album, artist, track},
        spotify::catalog::MockCatalog,
        types::{ExternalUrls, Followers, Image},
    };

    #[tokio::test]
    async fn test_search_maps_summary_fields() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search_artists().returning(|_, _, _| {
            let mut weeknd = artist("1Xyo4u8uXC1ZmMpatF05PJ", "The Weeknd");
            weeknd.external_urls = ExternalUrls {
                spotify: Some("https://open.spotify.com/artist/1Xyo4u8uXC1ZmMpatF05PJ".into()),
            };
            weeknd.images = vec![Image {
                url: "https://i.scdn.co/image/weeknd".into(),
                width: None,
                height: None,
            }];
            Ok(vec![weeknd, artist("2", "Without Image")])
        });

        let page = ArtistManager::new(Arc::new(catalog), "US")
            .search("weeknd", PageWindow { cursor: 0, limit: 2 })
            .await
            .unwrap();

        assert_eq!(page.next_cursor, Some(2));
        assert_eq!(
            page.items[0].image_url.as_deref(),
            Some("https://i.scdn.co/image/weeknd")
        );
        assert_eq!(page.items[1].image_url, None);
        let json = serde_json::to_value(&page.items[1]).unwrap();
        assert!(json.get("imageUrl").is_none());
    }

    #[tokio::test]
    async fn test_info_defaults_missing_numbers() {
        let mut catalog = MockCatalog::new();
        catalog.expect_get_artist().returning(|id| {
            let mut a = artist(id, "Muse");
            a.genres = vec!["rock".into()];
            a.followers = Some(Followers { total: 42 });
            Ok(a)
        });

        let info = ArtistManager::new(Arc::new(catalog), "US")
            .info("12Chz98pHFMPJEknJQMWvI")
            .await
            .unwrap();
        assert_eq!(info.followers, 42);
        assert_eq!(info.popularity, 0);
        assert_eq!(info.genres, vec!["rock"]);
    }

    #[tokio::test]
    async fn test_top_tracks_use_configured_market() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_artist_top_tracks()
            .withf(|_, market| market.to_string() == "BR")
            .times(1)
            .returning(|_, _| Ok(vec![track("t1", "Blinding Lights")]));

        let tracks = ArtistManager::new(Arc::new(catalog), "BR")
            .top_tracks("1Xyo4u8uXC1ZmMpatF05PJ")
            .await
            .unwrap();
        assert_eq!(tracks[0].title, "Blinding Lights");
    }

    #[tokio::test]
    async fn test_albums_pass_window_as_offset() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_artist_albums()
            .withf(|_, limit, offset| *limit == 10 && *offset == 30)
            .returning(|_, _, _| Ok(vec![album("4yP0hdKOZPNshxUOjY0cZj", "After Hours")]));

        let albums = ArtistManager::new(Arc::new(catalog), "US")
            .albums("1Xyo4u8uXC1ZmMpatF05PJ", PageWindow { cursor: 30, limit: 10 })
            .await
            .unwrap();
        assert_eq!(albums[0].title, "After Hours");
        assert_eq!(albums[0].total_tracks, 14);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_passed_through() {
        let mut catalog = MockCatalog::new();
        catalog.expect_get_artist().returning(|_| {
            Err(AppError::UpstreamUnavailable {
                status: Some(502),
                body: "bad gateway".into(),
            })
        });

        let err = ArtistManager::new(Arc::new(catalog), "US")
            .info("x")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable { .. }));
    }
}
