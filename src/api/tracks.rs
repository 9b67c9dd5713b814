use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    api::{
        AppState,
        extract::{MaybeUser, Params, PathParam},
    },
    error::Result,
    management::{AlbumDetail, AlbumTrack, DeezerTrackSummary, TrackDetail, TrackSummary, require_query},
    pagination::{CursorPage, CursorQuery},
};

/// `?query=...&cursor=...&limit=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchParams {
    pub fn page(&self) -> CursorQuery {
        CursorQuery::new(self.cursor, self.limit)
    }
}

pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Params(params): Params<SearchParams>,
) -> Result<Json<CursorPage<TrackSummary>>> {
    let query = require_query(params.query.as_deref())?;
    let window = params.page().window()?;
    if let Some(user) = &user {
        state.history.record(user.id, query).await;
    }
    Ok(Json(state.tracks.search(query, window).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<TrackDetail>> {
    Ok(Json(state.tracks.detail(&id).await?))
}

pub async fn deezer_search(
    State(state): State<AppState>,
    Params(params): Params<SearchParams>,
) -> Result<Json<Vec<DeezerTrackSummary>>> {
    let query = require_query(params.query.as_deref())?;
    Ok(Json(state.tracks.deezer_search(query).await?))
}

pub async fn album(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<AlbumDetail>> {
    Ok(Json(state.tracks.album(&id).await?))
}

pub async fn album_tracks(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    Params(query): Params<CursorQuery>,
) -> Result<Json<CursorPage<AlbumTrack>>> {
    let window = query.window()?;
    Ok(Json(state.tracks.album_tracks(&id, window).await?))
}
