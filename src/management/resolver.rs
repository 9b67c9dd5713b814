use std::sync::Arc;

use tracing::debug;

use crate::{
    db::{
        TrackRepository,
        models::{ExternalProvider, NewTrack, TrackRow},
    },
    deezer::DeezerClient,
    error::Result,
    management::tracks::first_image,
    spotify::Catalog,
    utils::join_artist_names,
};

/// Turns an `(external_id, provider)` pair into a local track row.
#[derive(Clone)]
pub struct TrackResolver {
    catalog: Arc<dyn Catalog>,
    deezer: DeezerClient,
    tracks: TrackRepository,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn Catalog>, deezer: DeezerClient, tracks: TrackRepository) -> Self {
        Self {
            catalog,
            deezer,
            tracks,
        }
    }

    /// Fetches the track from its provider and upserts the local copy.
    pub async fn refresh(&self, external_id: &str, provider: ExternalProvider) -> Result<TrackRow> {
        let track = self.fetch(external_id, provider).await?;
        self.tracks.upsert(&track).await
    }

    /// The stored track, fetched and stored first if the pair is unknown.
    pub async fn ensure(&self, external_id: &str, provider: ExternalProvider) -> Result<TrackRow> {
        if let Some(track) = self.tracks.find_by_external(external_id, provider).await? {
            return Ok(track);
        }
        debug!(external_id, %provider, "track not stored yet, fetching");
        self.refresh(external_id, provider).await
    }

    /// The stored track, without contacting any provider.
    pub async fn find(&self, external_id: &str, provider: ExternalProvider) -> Result<Option<TrackRow>> {
        self.tracks.find_by_external(external_id, provider).await
    }

    async fn fetch(&self, external_id: &str, provider: ExternalProvider) -> Result<NewTrack> {
        match provider {
            ExternalProvider::Spotify => {
                let track = self.catalog.get_track(external_id).await?;
                let artist = join_artist_names(track.artists.iter().map(|a| a.name.as_str()));
                Ok(NewTrack {
                    external_id: external_id.to_string(),
                    provider,
                    title: track.name,
                    artist: Some(artist),
                    album: track.album.as_ref().map(|album| album.name.clone()),
                    cover_url: track.album.as_ref().and_then(|album| first_image(&album.images)),
                })
            }
            ExternalProvider::Deezer => {
                let track = self.deezer.get_track(external_id).await?;
                Ok(NewTrack {
                    external_id: external_id.to_string(),
                    provider,
                    title: track.title,
                    artist: Some(track.artist.name),
                    album: Some(track.album.title),
                    cover_url: track.album.cover_medium,
                })
            }
        }
    }
}
