use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::{
        AppState,
        extract::{CurrentUser, PathParam, Payload},
    },
    error::Result,
    management::{RegisterUser, Registration, UserProfile},
};

pub async fn register(
    State(state): State<AppState>,
    Payload(request): Payload<RegisterUser>,
) -> Result<(StatusCode, Json<Registration>)> {
    let registration = state.users.register(&request).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user)
}

pub async fn get(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.users.get(id).await?))
}
