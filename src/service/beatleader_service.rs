use tracing::{debug, warn};

use super::lookup::{get_optional, join_url, LookupError, PlayerProfile, ProfileDirectory};

/// BeatLeader player lookups.
#[derive(Clone)]
pub struct BeatLeaderService {
    client: reqwest::Client,
    base_url: String,
}

impl BeatLeaderService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn get_player_by_discord_id(
        &self,
        discord_id: &str,
    ) -> Result<Option<PlayerProfile>, LookupError> {
        if discord_id.trim().is_empty() {
            return Err(LookupError::InvalidInput(
                "discord id must be a non-empty string.".to_string(),
            ));
        }
        let url = join_url(&self.base_url, &format!("player/discord/{discord_id}"));
        let result = get_optional::<PlayerProfile>(&self.client, url).await;
        match &result {
            Ok(Some(profile)) => debug!(discord_id, player = %profile.name, "Resolved player"),
            Ok(None) => debug!(discord_id, "Discord account not linked"),
            Err(e) => warn!(discord_id, error = %e, "Player lookup failed"),
        }
        result
    }
}

impl ProfileDirectory for BeatLeaderService {
    async fn resolve_profile(&self, discord_id: &str) -> Result<Option<PlayerProfile>, LookupError> {
        self.get_player_by_discord_id(discord_id).await
    }
}
