use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::{
        AppState,
        extract::{CurrentUser, PathParam, Payload},
    },
    error::Result,
    management::{CreateFollow, FollowDto},
};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(request): Payload<CreateFollow>,
) -> Result<(StatusCode, Json<FollowDto>)> {
    let follow = state.follows.follow(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.follows.unfollow(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FollowDto>>> {
    Ok(Json(state.follows.list(user.id).await?))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Vec<FollowDto>>> {
    Ok(Json(state.follows.list(user_id).await?))
}
