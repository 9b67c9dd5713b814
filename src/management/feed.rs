use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    db::{
        FeedRepository, ReviewRepository,
        models::{FavoriteActivityRow, PlatformCounts, PlaylistActivityRow, ReviewRow, TrendingTrackRow},
    },
    error::Result,
};

pub const DEFAULT_FEED_LIMIT: u32 = 10;
pub const DEFAULT_TRENDING_LIMIT: u32 = 10;
pub const DEFAULT_FEATURED_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTrack {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPlaylist {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub track_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Review,
    Favorite,
    Playlist,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedActivity {
    /// `<kind>-<row id>`, unique across kinds.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: &'static str,
    pub user: FeedUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<FeedTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<FeedPlaylist>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRow> for FeedActivity {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: format!("review-{}", row.id),
            kind: ActivityKind::Review,
            action: "reviewed",
            user: FeedUser {
                id: row.user_id,
                name: row.user_name.clone(),
            },
            rating: Some(row.rating),
            comment: row.comment.clone(),
            created_at: row.created_at,
            playlist: None,
            track: Some(review_track(row)),
        }
    }
}

impl From<FavoriteActivityRow> for FeedActivity {
    fn from(row: FavoriteActivityRow) -> Self {
        Self {
            id: format!("favorite-{}", row.id),
            kind: ActivityKind::Favorite,
            action: "favorited",
            user: FeedUser {
                id: row.user_id,
                name: row.user_name,
            },
            track: Some(FeedTrack {
                id: row.track_id,
                external_id: row.external_id,
                title: row.title,
                artist: row.artist,
                album: row.album,
                cover_url: row.cover_url,
            }),
            playlist: None,
            rating: None,
            comment: None,
            created_at: row.created_at,
        }
    }
}

impl From<PlaylistActivityRow> for FeedActivity {
    fn from(row: PlaylistActivityRow) -> Self {
        Self {
            id: format!("playlist-{}", row.id),
            kind: ActivityKind::Playlist,
            action: "created playlist",
            user: FeedUser {
                id: row.user_id,
                name: row.user_name,
            },
            track: None,
            playlist: Some(FeedPlaylist {
                id: row.id,
                name: row.name,
                description: row.description,
                track_count: row.track_count,
            }),
            rating: None,
            comment: None,
            created_at: row.created_at,
        }
    }
}

fn review_track(row: ReviewRow) -> FeedTrack {
    FeedTrack {
        id: row.track_id,
        external_id: row.external_id,
        title: row.title,
        artist: row.artist,
        album: row.album,
        cover_url: row.cover_url,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_reviews: i64,
    pub total_favorites: i64,
    pub total_playlists: i64,
    pub top_rated_tracks: i64,
    pub most_active_users: i64,
}

impl From<PlatformCounts> for PlatformStats {
    fn from(counts: PlatformCounts) -> Self {
        Self {
            total_users: counts.users,
            total_reviews: counts.reviews,
            total_favorites: counts.favorites,
            total_playlists: counts.playlists,
            top_rated_tracks: counts.top_rated_tracks,
            most_active_users: counts.most_active_users,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTrack {
    pub id: i64,
    pub external_id: String,
    pub external_provider: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub favorites_count: i64,
    pub reviews_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TrendingTrackRow> for TrendingTrack {
    fn from(row: TrendingTrackRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            external_provider: row.external_provider,
            title: row.title,
            artist: row.artist,
            album: row.album,
            cover_url: row.cover_url,
            favorites_count: row.favorites_count,
            reviews_count: row.reviews_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedReview {
    pub id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: FeedUser,
    pub track: FeedTrack,
}

impl From<ReviewRow> for FeaturedReview {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            rating: row.rating,
            comment: row.comment.clone(),
            created_at: row.created_at,
            user: FeedUser {
                id: row.user_id,
                name: row.user_name.clone(),
            },
            track: review_track(row),
        }
    }
}

/// Public, unauthenticated views over recent platform activity.
#[derive(Clone)]
pub struct FeedManager {
    feed: FeedRepository,
    reviews: ReviewRepository,
}

impl FeedManager {
    pub fn new(feed: FeedRepository, reviews: ReviewRepository) -> Self {
        Self { feed, reviews }
    }

    /// Latest reviews, favorites and playlists merged newest first.
    pub async fn public_feed(&self, limit: u32) -> Result<Vec<FeedActivity>> {
        let limit = i64::from(limit);
        let (reviews, favorites, playlists) = tokio::try_join!(
            self.reviews.list_recent(limit),
            self.feed.recent_favorites(limit),
            self.feed.recent_playlists(limit),
        )?;

        let mut activities: Vec<FeedActivity> = reviews
            .into_iter()
            .map(FeedActivity::from)
            .chain(favorites.into_iter().map(FeedActivity::from))
            .chain(playlists.into_iter().map(FeedActivity::from))
            .collect();
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        activities.truncate(limit as usize);
        Ok(activities)
    }

    /// Platform totals. Needs no user and never fails on an empty database.
    pub async fn stats(&self) -> Result<PlatformStats> {
        Ok(self.feed.counts().await?.into())
    }

    /// Tracks with favorites or reviews in the last 24 hours.
    pub async fn trending(&self, limit: u32) -> Result<Vec<TrendingTrack>> {
        let since = Utc::now() - Duration::hours(24);
        let rows = self.feed.trending(since, i64::from(limit)).await?;
        Ok(rows.into_iter().map(TrendingTrack::from).collect())
    }

    /// Well rated reviews that come with a comment.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of reviews, already clamped by the caller
    ///
    /// # Returns
    ///
    /// Reviews rated 4 or 5, highest rating first, then newest.
    pub async fn featured_reviews(&self, limit: u32) -> Result<Vec<FeaturedReview>> {
        let rows = self.reviews.list_featured(i64::from(limit)).await?;
        Ok(rows.into_iter().map(FeaturedReview::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{
            FavoriteRepository, PlaylistRepository, TrackRepository,
            models::{ExternalProvider, NewTrack},
        },
        management::test_support::{pool, user},
    };

    async fn stored_track(pool: &sqlx::SqlitePool, external_id: &str) -> i64 {
        TrackRepository::new(pool.clone())
            .upsert(&NewTrack {
                external_id: external_id.into(),
                provider: ExternalProvider::Spotify,
                title: format!("Track {external_id}"),
                artist: Some("The Weeknd".into()),
                album: None,
                cover_url: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn tick() {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn test_public_feed_merges_newest_first() {
        let pool = pool().await;
        let ana = user(&pool, "Ana").await;
        let track = stored_track(&pool, "a").await;

        ReviewRepository::new(pool.clone())
            .insert(ana, track, 5, Some("great"))
            .await
            .unwrap();
        tick().await;
        FavoriteRepository::new(pool.clone()).insert(ana, track).await.unwrap();
        tick().await;
        PlaylistRepository::new(pool.clone())
            .insert(ana, "Focus", None)
            .await
            .unwrap();

        let feed = FeedManager::new(FeedRepository::new(pool.clone()), ReviewRepository::new(pool.clone()));
        let activities = feed.public_feed(10).await.unwrap();
        assert_eq!(
            activities.iter().map(|a| a.kind).collect::<Vec<_>>(),
            vec![ActivityKind::Playlist, ActivityKind::Favorite, ActivityKind::Review]
        );
        assert_eq!(activities[2].id, "review-1");
        assert_eq!(activities[0].playlist.as_ref().map(|p| p.track_count), Some(0));

        let truncated = feed.public_feed(2).await.unwrap();
        assert_eq!(truncated.len(), 2);
    }

    #[tokio::test]
    async fn test_stats_and_featured_reviews() {
        let pool = pool().await;
        let reviews = ReviewRepository::new(pool.clone());
        let track = stored_track(&pool, "a").await;
        for (name, rating, comment) in [
            ("Ana", 5, Some("loved it")),
            ("Bea", 4, None),
            ("Caio", 3, Some("ok")),
        ] {
            let id = user(&pool, name).await;
            reviews.insert(id, track, rating, comment).await.unwrap();
        }

        let feed = FeedManager::new(FeedRepository::new(pool.clone()), reviews);
        let stats = feed.stats().await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.top_rated_tracks, 1);
        assert_eq!(stats.most_active_users, 3);

        let featured = feed.featured_reviews(5).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].user.name, "Ana");
    }

    #[tokio::test]
    async fn test_trending_counts_recent_activity() {
        let pool = pool().await;
        let ana = user(&pool, "Ana").await;
        let bea = user(&pool, "Bea").await;
        let hot = stored_track(&pool, "hot").await;
        let warm = stored_track(&pool, "warm").await;
        stored_track(&pool, "cold").await;

        let favorites = FavoriteRepository::new(pool.clone());
        favorites.insert(ana, hot).await.unwrap();
        favorites.insert(bea, hot).await.unwrap();
        favorites.insert(ana, warm).await.unwrap();

        let feed = FeedManager::new(FeedRepository::new(pool.clone()), ReviewRepository::new(pool.clone()));
        let trending = feed.trending(10).await.unwrap();
        assert_eq!(
            trending.iter().map(|t| t.external_id.as_str()).collect::<Vec<_>>(),
            vec!["hot", "warm"]
        );
        assert_eq!(trending[0].favorites_count, 2);
        assert_eq!(trending[0].reviews_count, 0);

        assert_eq!(feed.trending(1).await.unwrap().len(), 1);
    }
}
