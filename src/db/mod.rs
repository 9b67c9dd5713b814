//! # Persistence Module
//!
//! SQLite storage for everything the service owns: users and sessions,
//! local track copies, favorites, reviews, follows, playlists and search
//! history. Catalog data itself is never stored beyond the few summary
//! fields kept on `tracks`.
//!
//! Migrations under `migrations/` are embedded at compile time and applied
//! when the pool is created.
//!
//! ```rust,ignore
//! let pool = create_pool(DatabaseConfig::new("sqlite:vorplay.db")).await?;
//! let users = UserRepository::new(pool.clone());
//! ```

mod favorites;
mod feed;
mod follows;
mod history;
pub mod models;
mod playlists;
mod reviews;
mod tracks;
mod users;

use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::{debug, info, warn};

pub use favorites::FavoriteRepository;
pub use feed::FeedRepository;
pub use follows::FollowRepository;
pub use history::SearchHistoryRepository;
pub use playlists::PlaylistRepository;
pub use reviews::ReviewRepository;
pub use tracks::TrackRepository;
pub use users::UserRepository;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub max_lifetime: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        let database_url = database_url.into();
        if is_in_memory(&database_url) {
            return Self {
                database_url,
                ..Self::in_memory()
            };
        }

        Self {
            database_url,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    /// Each in-memory connection would open its own empty database, so the
    /// pool keeps exactly one connection alive for its whole lifetime.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
        }
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Opens the pool, enables foreign keys and applies pending migrations.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(database_url = %config.database_url, "opening database");

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .foreign_keys(true)
        .create_if_missing(true)
        .journal_mode(if is_in_memory(&config.database_url) {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        });

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(options)
        .await
        .inspect_err(|e| warn!(error = %e, "failed to open database"))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;
    debug!("database migrations applied");

    Ok(pool)
}

/// In-memory database with migrations applied.
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let pool = create_test_pool().await.unwrap();

        for table in [
            "users",
            "sessions",
            "tracks",
            "favorites",
            "reviews",
            "follows",
            "playlists",
            "playlist_tracks",
            "search_history",
        ] {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                    .bind(table)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert_eq!(count, 1, "table {table} should exist");
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.unwrap();
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_memory_urls_use_single_connection() {
        assert_eq!(DatabaseConfig::new("sqlite::memory:").max_connections, 1);
        assert_eq!(DatabaseConfig::new("sqlite:vorplay.db").max_connections, 5);
    }
}
