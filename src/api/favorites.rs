use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::{
        AppState,
        extract::{CurrentUser, PathParam, Payload},
    },
    error::Result,
    management::{CreateFavorite, FavoriteDto},
};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(request): Payload<CreateFavorite>,
) -> Result<(StatusCode, Json<FavoriteDto>)> {
    let favorite = state.favorites.add(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(track_id): PathParam<i64>,
) -> Result<StatusCode> {
    state.favorites.remove(user.id, track_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FavoriteDto>>> {
    Ok(Json(state.favorites.list(user.id).await?))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Vec<FavoriteDto>>> {
    Ok(Json(state.favorites.list(user_id).await?))
}
