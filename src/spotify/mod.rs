//! # Spotify Integration Module
//!
//! Client-credentials access to the Spotify Web API catalog. The layers,
//! from the bottom up:
//!
//! ```text
//! Domain managers
//!        ↓
//! CatalogClient   (typed search/detail/listing calls, envelope unwrapping)
//!        ↓                      ↘
//! TokenCache      (bearer token, refreshed on expiry)
//!        ↓
//! RetryingHttpClient (bounded exponential backoff on 502/reset/timeout)
//!        ↓
//! reqwest
//! ```
//!
//! ## Error mapping
//!
//! - missing credentials or URLs → `AppError::Configuration`
//! - token endpoint failures → `AppError::UpstreamAuth`
//! - 404 on single-entity lookups → `AppError::NotFound`
//! - everything else (exhausted retries, other statuses, bad JSON) →
//!   `AppError::UpstreamUnavailable`
//!
//! ## API Coverage
//!
//! - `POST {token_url}` - client-credentials grant
//! - `GET /search?type=track|artist` - paginated search
//! - `GET /tracks/{id}`, `GET /artists/{id}`, `GET /albums/{id}`
//! - `GET /artists/{id}/albums`, `GET /artists/{id}/top-tracks`
//! - `GET /albums/{id}/tracks`

pub mod catalog;
pub mod http;
pub mod token;

use std::sync::Arc;

use reqwest::{Client, Url};

pub use catalog::{Catalog, CatalogClient};
pub use http::{HttpError, RetryPolicy, RetryingHttpClient};
pub use token::{BearerToken, ClientCredentials, TokenCache};

use crate::{
    config::SpotifySettings,
    error::{AppError, Result},
};

/// Builds the shared reqwest client used for every upstream call.
pub fn http_client(policy: RetryPolicy) -> Result<RetryingHttpClient> {
    let http = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Configuration(format!("cannot build HTTP client: {e}")))?;
    Ok(RetryingHttpClient::new(http, policy))
}

/// Appends `segments` to `base`, each percent-encoded as a single path
/// segment, so a caller-supplied id can never add segments, a query or a
/// fragment to the upstream URL.
///
/// # Arguments
///
/// * `base` - API root, e.g. `https://api.spotify.com/v1`
/// * `setting` - name of the setting `base` came from, used in errors
/// * `segments` - path segments, ids included
///
/// # Returns
///
/// The joined URL. An unparsable `base` is a `Configuration` error; an
/// empty, `.` or `..` segment is a `Validation` error since it would
/// collapse into a different path.
///
/// # Example
///
/// ```rust,ignore
/// let url = endpoint("https://api.spotify.com/v1", "SPOTIFY_API_URL", &["tracks", "a/b"])?;
/// assert_eq!(url.as_str(), "https://api.spotify.com/v1/tracks/a%2Fb");
/// ```
pub fn endpoint(base: &str, setting: &str, segments: &[&str]) -> Result<Url> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(AppError::Validation(format!("invalid id '{bad}'")));
    }

    let mut url =
        Url::parse(base).map_err(|e| AppError::Configuration(format!("{setting}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Configuration(format!("{setting}: not a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl CatalogClient {
    /// Wires a token cache and a catalog client from the Spotify settings.
    /// Missing values only fail once a call needs them.
    pub fn from_settings(settings: &SpotifySettings, http: RetryingHttpClient) -> Self {
        let credentials = match (&settings.client_id, &settings.client_secret) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => None,
        };
        let tokens = TokenCache::new(http.clone(), settings.token_url.clone(), credentials);
        CatalogClient::new(http, Arc::new(tokens), settings.api_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_ids_in_one_segment() {
        let url = endpoint(
            "https://api.spotify.com/v1",
            "SPOTIFY_API_URL",
            &["tracks", "x/../../me/playlists?limit=50#"],
        )
        .unwrap();
        assert_eq!(url.path(), "/v1/tracks/x%2F..%2F..%2Fme%2Fplaylists%3Flimit=50%23");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let url = endpoint("https://api.spotify.com/v1/", "SPOTIFY_API_URL", &["tracks", "abc"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.spotify.com/v1/tracks/abc");
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        for id in ["", ".", ".."] {
            let err = endpoint("https://api.spotify.com/v1", "SPOTIFY_API_URL", &["tracks", id])
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{id:?}: {err:?}");
        }
    }

    #[test]
    fn test_endpoint_with_bad_base_is_configuration_error() {
        let err = endpoint("not a url", "SPOTIFY_API_URL", &["tracks"]).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
