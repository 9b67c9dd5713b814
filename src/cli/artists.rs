use tabled::{Table, Tabled};

use crate::{
    config::Settings,
    error, info,
    management::{ArtistManager, ArtistSummary},
    success, warning,
};

#[derive(Tabled)]
struct ArtistTableRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "url")]
    url: String,
}

impl From<ArtistSummary> for ArtistTableRow {
    fn from(artist: ArtistSummary) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            url: artist.external_url.unwrap_or_default(),
        }
    }
}

pub async fn search_artists(query: String, cursor: Option<u32>, limit: Option<u32>) {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };
    let window = match super::window(cursor, limit) {
        Ok(window) => window,
        Err(e) => error!("{}", e),
    };
    let catalog = match super::catalog(&settings) {
        Ok(catalog) => catalog,
        Err(e) => error!("Cannot build catalog client. Err: {}", e),
    };
    let manager = ArtistManager::new(catalog, settings.spotify.market.clone());

    let pb = super::spinner("Searching artists...");
    let page = manager.search(query.trim(), window).await;
    pb.finish_and_clear();

    let page = match page {
        Ok(page) => page,
        Err(e) => error!("Artist search failed. Err: {}", e),
    };
    if page.items.is_empty() {
        warning!("No artists found for '{}'", query.trim());
        return;
    }

    success!("Found {} artists", page.items.len());
    let rows: Vec<ArtistTableRow> = page.items.into_iter().map(ArtistTableRow::from).collect();
    println!("{}", Table::new(rows));

    if let Some(next) = page.next_cursor {
        info!("More results: --cursor {}", next);
    }
}
