//! Configuration management for the VorPlay service.
//!
//! Values come from the process environment, optionally seeded from `.env`
//! files. Precedence, highest first:
//! 1. Environment variables
//! 2. `.env` in the local data directory (`<data_local_dir>/vorplay/.env`)
//! 3. `.env` in the working directory
//! 4. Defaults below
//!
//! Settings are read once into [`Settings`] and passed down explicitly.

use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{AppError, Result},
    spotify::RetryPolicy,
};

pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_DEEZER_API_URL: &str = "https://api.deezer.com";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:vorplay.db";

/// Loads `.env` files into the process environment.
///
/// Creates `<data_local_dir>/vorplay/` if needed. Missing files are fine;
/// variables already present in the environment are never overwritten.
pub async fn load_env() -> Result<()> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("vorplay/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await.map_err(|e| {
            AppError::Configuration(format!("cannot create {}: {e}", parent.display()))
        })?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| {
            AppError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
    }
    dotenv::dotenv().ok();

    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotifySettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    pub api_url: Option<String>,
    pub market: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub spotify: SpotifySettings,
    pub deezer_api_url: String,
    pub server_addr: SocketAddr,
    pub database_url: String,
    pub retry: RetryPolicy,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let spotify = SpotifySettings {
            client_id: get("SPOTIFY_CLIENT_ID"),
            client_secret: get("SPOTIFY_CLIENT_SECRET"),
            token_url: get("SPOTIFY_TOKEN_URL"),
            api_url: get("SPOTIFY_API_URL"),
            market: get("SPOTIFY_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
        };

        let server_addr = get("SERVER_ADDRESS")
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Configuration(format!("SERVER_ADDRESS: {e}")))?;

        let base_ms: Option<u64> =
            parse_number(get("UPSTREAM_RETRY_BASE_MS"), "UPSTREAM_RETRY_BASE_MS")?;
        let max_retries: Option<u32> =
            parse_number(get("UPSTREAM_MAX_RETRIES"), "UPSTREAM_MAX_RETRIES")?;
        let defaults = RetryPolicy::default();
        let retry = RetryPolicy::new(
            max_retries.unwrap_or(defaults.max_retries),
            base_ms.map_or(defaults.base_delay, Duration::from_millis),
        );

        Ok(Self {
            spotify,
            deezer_api_url: get("DEEZER_API_URL")
                .unwrap_or_else(|| DEFAULT_DEEZER_API_URL.to_string()),
            server_addr,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            retry,
        })
    }
}

fn parse_number<T>(value: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| AppError::Configuration(format!("{key}: {e}")))
        })
        .transpose()
}
