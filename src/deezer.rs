//! Deezer public API client.
//!
//! Deezer's search and track endpoints need no credentials. Errors are
//! reported inside a `200 OK` body as `{"error": {...}}`, so the body is
//! inspected before it is decoded.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{AppError, Result},
    spotify::{RetryingHttpClient, endpoint},
    types::{DeezerErrorResponse, DeezerSearchResponse, DeezerTrack},
};

#[derive(Debug, Clone)]
pub struct DeezerClient {
    http: RetryingHttpClient,
    api_url: String,
}

impl DeezerClient {
    pub fn new(http: RetryingHttpClient, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<DeezerTrack>> {
        let response: DeezerSearchResponse = self
            .fetch(&["search"], &[("q", query.to_string())], None)
            .await?;
        Ok(response.data)
    }

    /// `NotFound` when Deezer reports an error for the id.
    pub async fn get_track(&self, id: &str) -> Result<DeezerTrack> {
        self.fetch(
            &["track", id],
            &[],
            Some(format!("deezer track {id} not found")),
        )
        .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        missing: Option<String>,
    ) -> Result<T> {
        let url = endpoint(&self.api_url, "DEEZER_API_URL", segments)?;
        debug!(%url, "deezer request");

        let response = self
            .http
            .execute(|client| client.get(url.clone()).query(query))
            .await
            .map_err(|err| AppError::UpstreamUnavailable {
                status: err.status().map(|s| s.as_u16()),
                body: err.detail(),
            })?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| malformed(err.to_string()))?;

        if body.get("error").is_some() {
            let detail = serde_json::from_value::<DeezerErrorResponse>(body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| "unknown deezer error".to_string());
            return Err(match missing {
                Some(what) => AppError::NotFound(what),
                None => AppError::UpstreamUnavailable {
                    status: None,
                    body: detail,
                },
            });
        }

        serde_json::from_value(body).map_err(|err| malformed(err.to_string()))
    }
}

fn malformed(detail: String) -> AppError {
    AppError::UpstreamUnavailable {
        status: None,
        body: format!("malformed deezer payload: {detail}"),
    }
}
