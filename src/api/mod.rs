//! # API Module
//!
//! HTTP surface of the service, built on axum. Every catalog and social
//! operation lives under `/api/v1`; `/health` stays at the root for liveness checks.
//!
//! ## Routes
//!
//! | Area | Routes |
//! |---|---|
//! | users | `POST /users`, `GET /users/me`, `GET /users/{id}` |
//! | tracks | `GET /tracks/search`, `GET /tracks/deezer/search`, `GET /tracks/{id}` |
//! | artists | `GET /artists/search`, `GET /artists/{id}`, `.../albums`, `.../top-tracks` |
//! | albums | `GET /albums/{id}`, `GET /albums/{id}/tracks` |
//! | favorites | `GET/POST /favorites`, `DELETE /favorites/{trackId}`, `GET /favorites/user/{id}` |
//! | reviews | `GET/POST /reviews`, `DELETE /reviews/{id}`, `GET /reviews/user/{id}`, `GET /reviews/track/{externalId}` |
//! | follows | `GET/POST /follows`, `DELETE /follows/{id}`, `GET /follows/user/{id}` |
//! | playlists | `GET/POST /playlists`, `GET/PUT/DELETE /playlists/{id}`, `POST /playlists/{id}/tracks`, `DELETE /playlists/{id}/tracks/{trackId}` |
//! | search history | `GET/DELETE /search-history`, `DELETE /search-history/{id}` |
//! | feed | `GET /feed/public`, `/feed/stats`, `/feed/trending`, `/feed/featured-reviews` |
//!
//! Authenticated routes expect `Authorization: Bearer <token>` as returned
//! by `POST /users`. Failures are rendered as
//! `{statusCode, timestamp, path, error}`.

mod artists;
mod extract;
mod favorites;
mod feed;
mod follows;
mod health;
mod history;
mod playlists;
mod reviews;
mod tracks;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{delete, get, post},
};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub use extract::{CurrentUser, MaybeUser};
pub use health::health;

use crate::{
    config::Settings,
    db::{
        DatabaseConfig, FavoriteRepository, FeedRepository, FollowRepository, PlaylistRepository,
        ReviewRepository, SearchHistoryRepository, TrackRepository, UserRepository, create_pool,
    },
    deezer::DeezerClient,
    error::{AppError, Result, attach_request_path},
    management::{
        ArtistManager, FavoritesManager, FeedManager, FollowsManager, HistoryManager,
        PlaylistsManager, ReviewsManager, TrackManager, TrackResolver, UsersManager,
    },
    spotify::{self, Catalog, CatalogClient},
};

/// Managers shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub users: UsersManager,
    pub tracks: TrackManager,
    pub artists: ArtistManager,
    pub favorites: FavoritesManager,
    pub reviews: ReviewsManager,
    pub follows: FollowsManager,
    pub playlists: PlaylistsManager,
    pub history: HistoryManager,
    pub feed: FeedManager,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        catalog: Arc<dyn Catalog>,
        deezer: DeezerClient,
        market: impl Into<String>,
    ) -> Self {
        let resolver = TrackResolver::new(
            Arc::clone(&catalog),
            deezer.clone(),
            TrackRepository::new(pool.clone()),
        );

        Self {
            users: UsersManager::new(UserRepository::new(pool.clone())),
            tracks: TrackManager::new(Arc::clone(&catalog), deezer),
            artists: ArtistManager::new(catalog, market),
            favorites: FavoritesManager::new(
                resolver.clone(),
                FavoriteRepository::new(pool.clone()),
            ),
            reviews: ReviewsManager::new(resolver.clone(), ReviewRepository::new(pool.clone())),
            follows: FollowsManager::new(FollowRepository::new(pool.clone())),
            playlists: PlaylistsManager::new(resolver, PlaylistRepository::new(pool.clone())),
            history: HistoryManager::new(SearchHistoryRepository::new(pool.clone())),
            feed: FeedManager::new(
                FeedRepository::new(pool.clone()),
                ReviewRepository::new(pool.clone()),
            ),
            pool,
        }
    }

    /// Opens the database and wires the upstream clients.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let pool = create_pool(DatabaseConfig::new(settings.database_url.clone())).await?;
        let http = spotify::http_client(settings.retry)?;
        let catalog = CatalogClient::from_settings(&settings.spotify, http.clone());
        let deezer = DeezerClient::new(http, settings.deezer_api_url.clone());

        Ok(Self::new(
            pool,
            Arc::new(catalog),
            deezer,
            settings.spotify.market.clone(),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", routes())
        .fallback(not_found)
        .layer(middleware::from_fn(attach_request_path))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::register))
        .route("/users/me", get(users::me))
        .route("/users/{id}", get(users::get))
        .route("/tracks/search", get(tracks::search))
        .route("/tracks/deezer/search", get(tracks::deezer_search))
        .route("/tracks/{id}", get(tracks::detail))
        .route("/artists/search", get(artists::search))
        .route("/artists/{id}", get(artists::info))
        .route("/artists/{id}/albums", get(artists::albums))
        .route("/artists/{id}/top-tracks", get(artists::top_tracks))
        .route("/albums/{id}", get(tracks::album))
        .route("/albums/{id}/tracks", get(tracks::album_tracks))
        .route(
            "/favorites",
            get(favorites::list_mine).post(favorites::create),
        )
        .route("/favorites/{id}", delete(favorites::remove))
        .route("/favorites/user/{id}", get(favorites::list_for_user))
        .route("/reviews", get(reviews::list_mine).post(reviews::create))
        .route("/reviews/{id}", delete(reviews::remove))
        .route("/reviews/user/{id}", get(reviews::list_for_user))
        .route("/reviews/track/{external_id}", get(reviews::list_for_track))
        .route("/follows", get(follows::list_mine).post(follows::create))
        .route("/follows/{id}", delete(follows::remove))
        .route("/follows/user/{id}", get(follows::list_for_user))
        .route("/playlists", get(playlists::list).post(playlists::create))
        .route(
            "/playlists/{id}",
            get(playlists::get)
                .put(playlists::update)
                .delete(playlists::delete),
        )
        .route("/playlists/{id}/tracks", post(playlists::add_track))
        .route(
            "/playlists/{id}/tracks/{track_id}",
            delete(playlists::remove_track),
        )
        .route("/search-history", get(history::list).delete(history::clear))
        .route("/search-history/{id}", delete(history::remove))
        .route("/feed/public", get(feed::public_feed))
        .route("/feed/stats", get(feed::stats))
        .route("/feed/trending", get(feed::trending))
        .route("/feed/featured-reviews", get(feed::featured_reviews))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
