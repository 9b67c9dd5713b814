//! Domain managers.
//!
//! Each manager owns one area of the service and maps catalog payloads and
//! stored rows to the DTOs the API returns. Managers are cheap to clone and
//! shared by every request.

mod artists;
mod favorites;
mod feed;
mod follows;
mod history;
mod playlists;
mod resolver;
mod reviews;
mod tracks;
mod users;

pub use artists::{AlbumSummary, ArtistInfo, ArtistManager, ArtistSummary};
pub use favorites::{CreateFavorite, FavoriteDto, FavoritesManager};
pub use feed::{
    ActivityKind, DEFAULT_FEATURED_LIMIT, DEFAULT_FEED_LIMIT, DEFAULT_TRENDING_LIMIT,
    FeaturedReview, FeedActivity, FeedManager, PlatformStats, TrendingTrack,
};
pub use follows::{CreateFollow, FollowDto, FollowsManager};
pub use history::{HistoryManager, SearchHistoryDto};
pub use playlists::{
    AddTrack, CreatePlaylist, PlaylistDetail, PlaylistDto, PlaylistEntry, PlaylistTrack,
    PlaylistsManager, UpdatePlaylist,
};
pub use resolver::TrackResolver;
pub use reviews::{CreateReview, ReviewDto, ReviewsManager};
pub use tracks::{
    AlbumDetail, AlbumTrack, DeezerTrackSummary, TrackDetail, TrackManager, TrackSummary,
    require_query,
};
pub use users::{RegisterUser, Registration, UserProfile, UsersManager};
