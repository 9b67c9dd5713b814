use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::{
        AppState,
        extract::{CurrentUser, PathParam, Payload},
    },
    error::Result,
    management::{CreateReview, ReviewDto},
};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(request): Payload<CreateReview>,
) -> Result<(StatusCode, Json<ReviewDto>)> {
    let review = state.reviews.add(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.reviews.remove(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ReviewDto>>> {
    Ok(Json(state.reviews.list_by_user(user.id).await?))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> Result<Json<Vec<ReviewDto>>> {
    Ok(Json(state.reviews.list_by_user(user_id).await?))
}

pub async fn list_for_track(
    State(state): State<AppState>,
    PathParam(external_id): PathParam<String>,
) -> Result<Json<Vec<ReviewDto>>> {
    Ok(Json(state.reviews.list_by_track(&external_id).await?))
}
