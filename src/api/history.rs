use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::{
        AppState,
        extract::{CurrentUser, Params, PathParam},
    },
    error::Result,
    management::SearchHistoryDto,
    pagination::{CursorPage, CursorQuery},
};

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(query): Params<CursorQuery>,
) -> Result<Json<CursorPage<SearchHistoryDto>>> {
    let window = query.window()?;
    Ok(Json(state.history.list(user.id, window).await?))
}

pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode> {
    state.history.clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.history.remove(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
