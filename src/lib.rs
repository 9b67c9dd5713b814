//! VorPlay service library
//!
//! Backend for a music social network: users keep playlists, favorite and
//! review tracks and follow each other, while track, artist and album
//! metadata is read from the Spotify Web API (with a small Deezer variant).
//!
//! # Modules
//!
//! - `api` - axum handlers, extractors and the HTTP router
//! - `cli` - command-line entry points of the `vorplay` binary
//! - `config` - `.env` loading and typed settings
//! - `db` - SQLite persistence (pool, migrations, queries)
//! - `deezer` - Deezer public API client
//! - `error` - the service error taxonomy and its HTTP rendering
//! - `management` - domain managers mapping catalog and database data to DTOs
//! - `pagination` - numeric cursor pages over offset/limit sources
//! - `server` - binds and serves the HTTP router
//! - `spotify` - token cache, retrying HTTP client and catalog client
//! - `types` - upstream wire payloads
//! - `utils` - session tokens and small helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod deezer;
pub mod error;
pub mod management;
pub mod pagination;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{AppError, Result};

/// Prints an informational message with a blue bullet point.
///
/// Console output for the CLI; service diagnostics go through `tracing`.
///
/// ```
/// info!("Searching the catalog for {}", query);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal CLI errors: the process terminates with exit code 1
/// right after printing.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
