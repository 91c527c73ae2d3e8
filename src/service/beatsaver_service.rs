use tracing::{debug, warn};

use super::lookup::{get_optional, join_url, LookupError, MapCatalog, MapInfo};

/// BeatSaver map catalog lookups.
#[derive(Clone)]
pub struct BeatSaverService {
    client: reqwest::Client,
    base_url: String,
}

impl BeatSaverService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn get_map_by_hash(&self, hash: &str) -> Result<Option<MapInfo>, LookupError> {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(LookupError::InvalidInput(
                "hash must be a non-empty string.".to_string(),
            ));
        }
        let url = join_url(&self.base_url, &format!("maps/hash/{hash}"));
        let result = get_optional::<MapInfo>(&self.client, url).await;
        match &result {
            Ok(Some(map)) => debug!(hash, map_id = %map.id, "Resolved map"),
            Ok(None) => debug!(hash, "Map hash not in catalog"),
            Err(e) => warn!(hash, error = %e, "Map lookup failed"),
        }
        result
    }
}

impl MapCatalog for BeatSaverService {
    async fn resolve_map_by_hash(&self, hash: &str) -> Result<Option<MapInfo>, LookupError> {
        self.get_map_by_hash(hash).await
    }
}
