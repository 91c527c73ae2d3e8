//! Read-only lookups against external player and map services.

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("{0}")]
    InvalidInput(String),
}

/// External player profile linked to a chat account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub rank: Option<i64>,
    /// ISO country code.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_rank: Option<i64>,
    #[serde(default)]
    pub pp: f64,
    #[serde(default)]
    pub clans: Vec<Clan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clan {
    pub tag: String,
}

/// Catalog entry for a map, looked up by content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Resolves a chat-platform user id to an external player profile.
pub trait ProfileDirectory: Send + Sync {
    /// `Ok(None)` means the account is not linked.
    fn resolve_profile(
        &self,
        discord_id: &str,
    ) -> impl Future<Output = Result<Option<PlayerProfile>, LookupError>> + Send;
}

/// Resolves a map content hash to its catalog id.
pub trait MapCatalog: Send + Sync {
    fn resolve_map_by_hash(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<Option<MapInfo>, LookupError>> + Send;
}

/// Shared GET helper: 404 is `None`, any other failure status is an error.
pub(crate) async fn get_optional<T>(
    client: &reqwest::Client,
    url: String,
) -> Result<Option<T>, LookupError>
where
    T: serde::de::DeserializeOwned,
{
    let response = client.get(&url).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(LookupError::UnexpectedStatus {
            status: status.as_u16(),
            url,
        });
    }
    Ok(Some(response.json::<T>().await?))
}

/// Joins a base URL and a relative path with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
