use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        FollowRepository,
        models::{FollowEntryRow, FollowRow, FollowTarget},
    },
    error::{AppError, Result},
    management::UserProfile,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollow {
    pub target_type: FollowTarget,
    pub target_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowDto {
    pub id: i64,
    pub target_type: FollowTarget,
    pub target_id: i64,
    pub follower_id: i64,
    pub created_at: DateTime<Utc>,
    /// Followed user's profile; only present in listings of user targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl TryFrom<FollowRow> for FollowDto {
    type Error = AppError;

    fn try_from(row: FollowRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            target_type: row.target_type.parse()?,
            target_id: row.target_id,
            follower_id: row.follower_id,
            created_at: row.created_at,
            user: None,
        })
    }
}

impl TryFrom<FollowEntryRow> for FollowDto {
    type Error = AppError;

    fn try_from(row: FollowEntryRow) -> Result<Self> {
        let user = match (row.user_name, row.user_email, row.user_created_at) {
            (Some(name), Some(email), Some(created_at)) => Some(UserProfile {
                id: row.target_id,
                name,
                email,
                created_at,
            }),
            _ => None,
        };
        Ok(Self {
            id: row.id,
            target_type: row.target_type.parse()?,
            target_id: row.target_id,
            follower_id: row.follower_id,
            created_at: row.created_at,
            user,
        })
    }
}

/// Follows of users and artists by signed-in users.
#[derive(Clone)]
pub struct FollowsManager {
    follows: FollowRepository,
}

impl FollowsManager {
    pub fn new(follows: FollowRepository) -> Self {
        Self { follows }
    }

    /// Following yourself or the same target twice is a `Conflict`.
    pub async fn follow(&self, follower_id: i64, request: &CreateFollow) -> Result<FollowDto> {
        if request.target_type == FollowTarget::User && request.target_id == follower_id {
            return Err(AppError::Conflict("cannot follow yourself".into()));
        }
        let row = self
            .follows
            .insert(follower_id, request.target_type, request.target_id)
            .await?;
        row.try_into()
    }

    /// `NotFound` when the follow does not exist or belongs to someone else.
    pub async fn unfollow(&self, follower_id: i64, follow_id: i64) -> Result<()> {
        if self.follows.delete(follower_id, follow_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("follow not found".into()))
        }
    }

    /// Everything `follower_id` follows, newest first, with followed users'
    /// profiles embedded.
    pub async fn list(&self, follower_id: i64) -> Result<Vec<FollowDto>> {
        self.follows
            .list_by_follower(follower_id)
            .await?
            .into_iter()
            .map(FollowDto::try_from)
            .collect()
    }
}
