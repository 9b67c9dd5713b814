use std::sync::Arc;

use tabled::{Table, Tabled};

use crate::{
    config::Settings,
    deezer::DeezerClient,
    error, info,
    management::{TrackManager, TrackSummary},
    spotify::{self, CatalogClient},
    success, warning,
};

#[derive(Tabled)]
struct TrackTableRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "artists")]
    artists: String,
    #[tabled(rename = "album")]
    album: String,
    #[tabled(rename = "length")]
    length: String,
}

impl From<TrackSummary> for TrackTableRow {
    fn from(track: TrackSummary) -> Self {
        let seconds = track.duration_ms / 1000;
        Self {
            id: track.id,
            title: track.title,
            artists: track.artist_names.join(", "),
            album: track.album_name,
            length: format!("{}:{:02}", seconds / 60, seconds % 60),
        }
    }
}

pub async fn search_tracks(query: String, cursor: Option<u32>, limit: Option<u32>) {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    let window = match super::window(cursor, limit) {
        Ok(window) => window,
        Err(e) => error!("{}", e),
    };
    let http = match spotify::http_client(settings.retry) {
        Ok(http) => http,
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    };
    let catalog = CatalogClient::from_settings(&settings.spotify, http.clone());
    let manager = TrackManager::new(
        Arc::new(catalog),
        DeezerClient::new(http, settings.deezer_api_url.clone()),
    );

    let pb = super::spinner("Searching tracks...");
    let page = manager.search(query.trim(), window).await;
    pb.finish_and_clear();

    let page = match page {
        Ok(page) => page,
        Err(e) => error!("Track search failed. Err: {}", e),
    };
    if page.items.is_empty() {
        warning!("No tracks found for '{}'", query.trim());
        return;
    }

    success!("Found {} tracks", page.items.len());
    let rows: Vec<TrackTableRow> = page.items.into_iter().map(TrackTableRow::from).collect();
    println!("{}", Table::new(rows));

    if let Some(next) = page.next_cursor {
        info!("More results: --cursor {}", next);
    }
}
