use tracing::{info, warn};

use super::lookup::MapCatalog;
use crate::api_error::ApiError;
use crate::models::playlist::{ImportReport, Playlist};
use crate::models::tournament::TournamentPatch;
use crate::store::TournamentStore;

/// Fills a tournament's map list from a playlist.
pub struct PlaylistService<M> {
    store: TournamentStore,
    catalog: M,
}

impl<M: MapCatalog> PlaylistService<M> {
    pub fn new(store: TournamentStore, catalog: M) -> Self {
        Self { store, catalog }
    }

    /// Resolve every song hash and replace the tournament's `mapIds`.
    ///
    /// Order follows the playlist and duplicates are dropped. Hashes the
    /// catalog does not know are reported, not stored. A lookup failure
    /// aborts the import before anything is written.
    pub async fn import(
        &self,
        tournament_name: &str,
        playlist: Playlist,
    ) -> Result<ImportReport, ApiError> {
        // Fail fast before spending lookups on a tournament that does not exist.
        self.store.find_by_name(tournament_name).await?;

        if playlist.songs.iter().any(|song| song.hash.trim().is_empty()) {
            return Err(ApiError::validation("Every playlist song needs a hash."));
        }

        let mut map_ids: Vec<String> = Vec::new();
        let mut unresolved = Vec::new();
        for song in &playlist.songs {
            match self.catalog.resolve_map_by_hash(&song.hash).await? {
                Some(map) => {
                    if !map_ids.contains(&map.id) {
                        map_ids.push(map.id);
                    }
                }
                None => unresolved.push(song.hash.clone()),
            }
        }

        if !unresolved.is_empty() {
            warn!(
                tournament = %tournament_name,
                unresolved = unresolved.len(),
                "Some playlist songs are not in the map catalog"
            );
        }

        let tournament = self
            .store
            .upsert(
                tournament_name,
                TournamentPatch::default().with_map_ids(map_ids),
            )
            .await?;

        info!(
            tournament = %tournament_name,
            playlist = %playlist.playlist_title,
            maps = tournament.map_ids.len(),
            "Imported playlist"
        );

        Ok(ImportReport {
            tournament: tournament.name,
            playlist_title: playlist.playlist_title,
            map_ids: tournament.map_ids,
            unresolved,
        })
    }
}
