use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    api::{AppState, extract::Params},
    error::{AppError, Result},
    management::{
        DEFAULT_FEATURED_LIMIT, DEFAULT_FEED_LIMIT, DEFAULT_TRENDING_LIMIT, FeaturedReview,
        FeedActivity, PlatformStats, TrendingTrack,
    },
    pagination::MAX_LIMIT,
};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    /// Missing or zero falls back to `default`; anything above
    /// [`MAX_LIMIT`] is clamped to it. Negative limits are rejected.
    fn resolve(self, default: u32) -> Result<u32> {
        match self.limit {
            None | Some(0) => Ok(default),
            Some(limit) if limit < 0 => Err(AppError::Validation(
                "limit must not be negative".to_string(),
            )),
            Some(limit) => Ok(u32::try_from(limit).map_or(MAX_LIMIT, |n| n.min(MAX_LIMIT))),
        }
    }
}

pub async fn public_feed(
    State(state): State<AppState>,
    Params(params): Params<LimitParams>,
) -> Result<Json<Vec<FeedActivity>>> {
    let limit = params.resolve(DEFAULT_FEED_LIMIT)?;
    Ok(Json(state.feed.public_feed(limit).await?))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<PlatformStats>> {
    Ok(Json(state.feed.stats().await?))
}

pub async fn trending(
    State(state): State<AppState>,
    Params(params): Params<LimitParams>,
) -> Result<Json<Vec<TrendingTrack>>> {
    let limit = params.resolve(DEFAULT_TRENDING_LIMIT)?;
    Ok(Json(state.feed.trending(limit).await?))
}

pub async fn featured_reviews(
    State(state): State<AppState>,
    Params(params): Params<LimitParams>,
) -> Result<Json<Vec<FeaturedReview>>> {
    let limit = params.resolve(DEFAULT_FEATURED_LIMIT)?;
    Ok(Json(state.feed.featured_reviews(limit).await?))
}
