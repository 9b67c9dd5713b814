use axum::{Json, extract::State};

use crate::{
    api::{
        AppState,
        extract::{MaybeUser, Params, PathParam},
        tracks::SearchParams,
    },
    error::Result,
    management::{AlbumSummary, ArtistInfo, ArtistSummary, TrackSummary, require_query},
    pagination::{CursorPage, CursorQuery},
};

pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Params(params): Params<SearchParams>,
) -> Result<Json<CursorPage<ArtistSummary>>> {
    let query = require_query(params.query.as_deref())?;
    let window = params.page().window()?;
    if let Some(user) = &user {
        state.history.record(user.id, query).await;
    }
    Ok(Json(state.artists.search(query, window).await?))
}

pub async fn info(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<ArtistInfo>> {
    Ok(Json(state.artists.info(&id).await?))
}

pub async fn albums(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    Params(query): Params<CursorQuery>,
) -> Result<Json<Vec<AlbumSummary>>> {
    let window = query.window()?;
    Ok(Json(state.artists.albums(&id, window).await?))
}

pub async fn top_tracks(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<Vec<TrackSummary>>> {
    Ok(Json(state.artists.top_tracks(&id).await?))
}
