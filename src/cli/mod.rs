//! # CLI Module
//!
//! Entry points of the `vorplay` binary:
//!
//! - [`serve`] - opens the database and serves the HTTP API
//! - [`search_tracks`] - one page of track search results as a table
//! - [`search_artists`] - one page of artist search results as a table
//!
//! The search commands talk to the catalog directly and never touch the
//! database, so they work with only the Spotify credentials configured.
//!
//! ```bash
//! vorplay serve --addr 0.0.0.0:3000
//! vorplay tracks --search "blinding lights" --limit 5
//! vorplay artists --search daft --cursor 20
//! ```

mod artists;
mod serve;
mod tracks;

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

pub use artists::search_artists;
pub use serve::serve;
pub use tracks::search_tracks;

use crate::{
    config::Settings,
    error::Result,
    pagination::{CursorQuery, PageWindow},
    spotify::{self, Catalog, CatalogClient},
};

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn catalog(settings: &Settings) -> Result<Arc<dyn Catalog>> {
    let http = spotify::http_client(settings.retry)?;
    Ok(Arc::new(CatalogClient::from_settings(&settings.spotify, http)))
}

fn window(cursor: Option<u32>, limit: Option<u32>) -> Result<PageWindow> {
    CursorQuery::new(cursor.map(i64::from), limit.map(i64::from)).window()
}
