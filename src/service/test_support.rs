//! In-memory lookup services for tests.

use std::collections::HashMap;

use super::lookup::{LookupError, MapCatalog, MapInfo, PlayerProfile, ProfileDirectory};

/// Profiles keyed by discord id; `fail` simulates an unreachable service.
#[derive(Default)]
pub struct StaticProfiles {
    pub profiles: HashMap<String, String>,
    pub fail: bool,
}

impl StaticProfiles {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            profiles: entries
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            profiles: HashMap::new(),
            fail: true,
        }
    }
}

impl ProfileDirectory for StaticProfiles {
    async fn resolve_profile(&self, discord_id: &str) -> Result<Option<PlayerProfile>, LookupError> {
        if self.fail {
            return Err(LookupError::UnexpectedStatus {
                status: 503,
                url: format!("player/discord/{discord_id}"),
            });
        }
        Ok(self.profiles.get(discord_id).map(|name| PlayerProfile {
            id: format!("bl-{discord_id}"),
            name: name.clone(),
            rank: Some(100),
            country: Some("US".to_string()),
            country_rank: Some(10),
            pp: 9876.543,
            ..Default::default()
        }))
    }
}

/// Map ids keyed by hash; `fail` simulates an unreachable catalog.
#[derive(Default)]
pub struct StaticCatalog {
    pub maps: HashMap<String, String>,
    pub fail: bool,
}

impl StaticCatalog {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            maps: entries
                .iter()
                .map(|(hash, id)| (hash.to_string(), id.to_string()))
                .collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            maps: HashMap::new(),
            fail: true,
        }
    }
}

impl MapCatalog for StaticCatalog {
    async fn resolve_map_by_hash(&self, hash: &str) -> Result<Option<MapInfo>, LookupError> {
        if self.fail {
            return Err(LookupError::UnexpectedStatus {
                status: 503,
                url: format!("maps/hash/{hash}"),
            });
        }
        Ok(self.maps.get(hash).map(|id| MapInfo {
            id: id.clone(),
            name: None,
        }))
    }
}
