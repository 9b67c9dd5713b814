use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::{
        AppState,
        extract::{CurrentUser, PathParam, Payload},
    },
    error::Result,
    management::{AddTrack, CreatePlaylist, PlaylistDetail, PlaylistDto, PlaylistTrack, UpdatePlaylist},
};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(request): Payload<CreatePlaylist>,
) -> Result<(StatusCode, Json<PlaylistDto>)> {
    let playlist = state.playlists.create(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PlaylistDto>>> {
    Ok(Json(state.playlists.list(user.id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<PlaylistDetail>> {
    Ok(Json(state.playlists.get(id, user.id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
    Payload(request): Payload<UpdatePlaylist>,
) -> Result<Json<PlaylistDto>> {
    Ok(Json(state.playlists.update(id, user.id, &request).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.playlists.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_track(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
    Payload(request): Payload<AddTrack>,
) -> Result<(StatusCode, Json<PlaylistTrack>)> {
    let entry = state.playlists.add_track(id, user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_track(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam((id, track_id)): PathParam<(i64, i64)>,
) -> Result<StatusCode> {
    state.playlists.remove_track(id, user.id, track_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
