use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        ReviewRepository,
        models::{ExternalProvider, ReviewRow},
    },
    error::{AppError, Result},
    management::resolver::TrackResolver,
};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// `id` is the Spotify id of the reviewed track.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i64,
    pub track_id: i64,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub user_id: i64,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRow> for ReviewDto {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            track_id: row.track_id,
            external_id: row.external_id,
            title: row.title,
            artist: row.artist,
            album: row.album,
            cover_url: row.cover_url,
            rating: row.rating,
            comment: row.comment,
            user_id: row.user_id,
            user_name: row.user_name,
            created_at: row.created_at,
        }
    }
}

/// Ratings and comments on Spotify tracks.
#[derive(Clone)]
pub struct ReviewsManager {
    resolver: TrackResolver,
    reviews: ReviewRepository,
}

impl ReviewsManager {
    pub fn new(resolver: TrackResolver, reviews: ReviewRepository) -> Self {
        Self { resolver, reviews }
    }

    /// Reviews a Spotify track, storing or refreshing the local copy first.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Author
    /// * `request` - Spotify track id, rating and optional comment
    ///
    /// # Returns
    ///
    /// The stored review. `Validation` for a blank id or a rating outside
    /// `MIN_RATING..=MAX_RATING`, `NotFound` when the catalog does not know the
    /// track. A blank comment is stored as no comment.
    pub async fn add(&self, user_id: i64, request: &CreateReview) -> Result<ReviewDto> {
        let external_id = request.id.trim();
        if external_id.is_empty() {
            return Err(AppError::Validation("id must not be empty".into()));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
            return Err(AppError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let track = self
            .resolver
            .refresh(external_id, ExternalProvider::Spotify)
            .await?;
        let comment = request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let row = self
            .reviews
            .insert(user_id, track.id, request.rating, comment)
            .await?;
        Ok(row.into())
    }

    /// Only the author can delete a review; anything else is `NotFound`.
    pub async fn remove(&self, user_id: i64, review_id: i64) -> Result<()> {
        if self.reviews.delete(user_id, review_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("review not found".into()))
        }
    }

    /// Reviews written by `user_id`, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<ReviewDto>> {
        let rows = self.reviews.list_by_user(user_id).await?;
        Ok(rows.into_iter().map(ReviewDto::from).collect())
    }

    /// Reviews of a stored Spotify track, newest first.
    pub async fn list_by_track(&self, external_id: &str) -> Result<Vec<ReviewDto>> {
        let track = self
            .resolver
            .find(external_id, ExternalProvider::Spotify)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("track {external_id} not found")))?;
        let rows = self.reviews.list_by_track(track.id).await?;
        Ok(rows.into_iter().map(ReviewDto::from).collect())
    }
}
