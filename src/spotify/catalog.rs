use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::{AppError, Result},
    spotify::{
        endpoint,
        http::{HttpError, RetryingHttpClient},
        token::TokenCache,
    },
    types::{Album, Artist, Paging, SearchResponse, TopTracksResponse, Track},
};

/// Read-only view of the upstream music catalog.
///
/// Domain managers depend on this trait rather than on [`CatalogClient`] so
/// they can run against a mock in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<Track>>;

    async fn search_artists(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<Artist>>;

    /// `NotFound` when the upstream answers 404.
    async fn get_track(&self, id: &str) -> Result<Track>;

    /// `NotFound` when the upstream answers 404.
    async fn get_artist(&self, id: &str) -> Result<Artist>;

    async fn get_artist_albums(&self, id: &str, limit: u32, offset: u32) -> Result<Vec<Album>>;

    async fn get_artist_top_tracks(&self, id: &str, market: &str) -> Result<Vec<Track>>;

    /// `NotFound` when the upstream answers 404.
    async fn get_album(&self, id: &str) -> Result<Album>;

    async fn get_album_tracks(&self, album_id: &str, limit: u32, offset: u32)
    -> Result<Vec<Track>>;
}

/// Spotify Web API implementation of [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: RetryingHttpClient,
    tokens: Arc<TokenCache>,
    api_url: Option<String>,
}

impl CatalogClient {
    pub fn new(http: RetryingHttpClient, tokens: Arc<TokenCache>, api_url: Option<String>) -> Self {
        Self {
            http,
            tokens,
            api_url,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let base = self
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("SPOTIFY_API_URL must be set".to_string()))?;
        endpoint(base, "SPOTIFY_API_URL", segments)
    }

    /// GETs the path made of `segments` with bearer auth and decodes the
    /// JSON body.
    ///
    /// A 404 becomes `NotFound(missing)` when `missing` is given; every other
    /// failure is reported as `UpstreamUnavailable`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        missing: Option<String>,
    ) -> Result<T> {
        let url = self.url(segments)?;
        let token = self.tokens.get_token().await?;
        debug!(%url, "catalog request");

        let response = self
            .http
            .execute(|client| client.get(url.clone()).query(query).bearer_auth(&token.value))
            .await
            .map_err(|err| match (err.status(), missing) {
                (Some(StatusCode::NOT_FOUND), Some(what)) => AppError::NotFound(what),
                (status, _) => unavailable(status, &err),
            })?;

        let status = response.status();
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::UpstreamUnavailable {
                status: Some(status.as_u16()),
                body: format!("malformed catalog payload: {err}"),
            })
    }
}

fn unavailable(status: Option<StatusCode>, err: &HttpError) -> AppError {
    AppError::UpstreamUnavailable {
        status: status.map(|s| s.as_u16()),
        body: err.detail(),
    }
}

fn search_params(query: &str, kind: &str, limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.to_string()),
        ("type", kind.to_string()),
        ("limit", limit.to_string()),
        ("offset", offset.to_string()),
    ]
}

fn page_params(limit: u32, offset: u32) -> Vec<(&'static str, String)> {
    vec![("limit", limit.to_string()), ("offset", offset.to_string())]
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<Track>> {
        let response: SearchResponse = self
            .fetch(&["search"], &search_params(query, "track", limit, offset), None)
            .await?;
        Ok(response.tracks.map(|page| page.items).unwrap_or_default())
    }

    async fn search_artists(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<Artist>> {
        let response: SearchResponse = self
            .fetch(&["search"], &search_params(query, "artist", limit, offset), None)
            .await?;
        Ok(response.artists.map(|page| page.items).unwrap_or_default())
    }

    async fn get_track(&self, id: &str) -> Result<Track> {
        self.fetch(
            &["tracks", id],
            &[],
            Some(format!("track {id} not found")),
        )
        .await
    }

    async fn get_artist(&self, id: &str) -> Result<Artist> {
        self.fetch(
            &["artists", id],
            &[],
            Some(format!("artist {id} not found")),
        )
        .await
    }

    async fn get_artist_albums(&self, id: &str, limit: u32, offset: u32) -> Result<Vec<Album>> {
        let page: Paging<Album> = self
            .fetch(&["artists", id, "albums"], &page_params(limit, offset), None)
            .await?;
        Ok(page.items)
    }

    async fn get_artist_top_tracks(&self, id: &str, market: &str) -> Result<Vec<Track>> {
        let response: TopTracksResponse = self
            .fetch(
                &["artists", id, "top-tracks"],
                &[("market", market.to_string())],
                None,
            )
            .await?;
        Ok(response.tracks)
    }

    async fn get_album(&self, id: &str) -> Result<Album> {
        self.fetch(
            &["albums", id],
            &[],
            Some(format!("album {id} not found")),
        )
        .await
    }

    async fn get_album_tracks(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Track>> {
        let page: Paging<Track> = self
            .fetch(
                &["albums", album_id, "tracks"],
                &page_params(limit, offset),
                None,
            )
            .await?;
        Ok(page.items)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::*;
    use crate::spotify::http::RetryPolicy;

    fn client(api_url: Option<&str>) -> CatalogClient {
        let http = RetryingHttpClient::new(Client::new(), RetryPolicy::default());
        let tokens = Arc::new(TokenCache::new(http.clone(), None, None));
        CatalogClient::new(http, tokens, api_url.map(str::to_string))
    }

    #[test]
    fn test_url_encodes_id_segment() {
        let catalog = client(Some("https://api.spotify.com/v1/"));
        assert_eq!(
            catalog.url(&["albums", "a b/c", "tracks"]).unwrap().as_str(),
            "https://api.spotify.com/v1/albums/a%20b%2Fc/tracks"
        );
    }

    #[tokio::test]
    async fn test_missing_api_url_is_configuration_error() {
        let err = client(None).get_track("abc").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)), "{err:?}");
    }

    #[test]
    fn test_search_params() {
        let params = search_params("blinding lights", "track", 1, 0);
        assert_eq!(
            params,
            vec![
                ("q", "blinding lights".to_string()),
                ("type", "track".to_string()),
                ("limit", "1".to_string()),
                ("offset", "0".to_string()),
            ]
        );
    }
}
