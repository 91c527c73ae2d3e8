use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A named, time-boxed event with its map list and player roster.
///
/// The field names on disk are camelCase; `name` is the only lookup key.
/// Timestamps are kept exactly as stored and keys this service does not know
/// are carried in `extra`, so rewriting the file leaves other records as they were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub name: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    start_date: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    end_date: Option<Value>,
    #[serde(default)]
    pub map_ids: Vec<String>,
    #[serde(default)]
    pub players: Vec<Registration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "discordId", default)]
    pub discord_id: String,
    /// Profile name captured at join time.
    #[serde(rename = "beatleaderUsername", default)]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Registration {
    pub fn new(discord_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            discord_id: discord_id.into(),
            display_name: display_name.into(),
            extra: Map::new(),
        }
    }
}

/// Partial tournament used by upserts. `None` leaves the stored field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentPatch {
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub map_ids: Option<Vec<String>>,
    pub players: Option<Vec<Registration>>,
}

impl Tournament {
    pub fn new(name: impl Into<String>, start_date: i64, end_date: i64) -> Self {
        Self {
            name: name.into(),
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
            map_ids: Vec::new(),
            players: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Epoch seconds, or `None` when the stored value is missing or not numeric.
    pub fn start_date(&self) -> Option<i64> {
        self.start_date.as_ref().and_then(epoch_from_value)
    }

    pub fn end_date(&self) -> Option<i64> {
        self.end_date.as_ref().and_then(epoch_from_value)
    }

    /// `startDate <= now <= endDate`. Records with an unknown bound are never active.
    pub fn is_active(&self, now: i64) -> bool {
        match (self.start_date(), self.end_date()) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    pub fn is_registered(&self, discord_id: &str) -> bool {
        self.players.iter().any(|p| p.discord_id == discord_id)
    }

    /// Adds the player unless the id is already on the roster. Returns whether it was added.
    pub fn add_player(&mut self, registration: Registration) -> bool {
        if self.is_registered(&registration.discord_id) {
            return false;
        }
        self.players.push(registration);
        true
    }

    /// Drops every registration with this id. Returns whether anything was removed.
    pub fn remove_player(&mut self, discord_id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.discord_id != discord_id);
        self.players.len() != before
    }

    pub fn apply(&mut self, patch: TournamentPatch) {
        if let Some(start_date) = patch.start_date {
            self.start_date = Some(start_date.into());
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date.into());
        }
        if let Some(map_ids) = patch.map_ids {
            self.map_ids = map_ids;
        }
        if let Some(players) = patch.players {
            self.players = players;
        }
    }
}

impl TournamentPatch {
    pub fn window(start_date: i64, end_date: i64) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        }
    }

    pub fn with_map_ids(mut self, map_ids: Vec<String>) -> Self {
        self.map_ids = Some(map_ids);
        self
    }

    pub fn with_players(mut self, players: Vec<Registration>) -> Self {
        self.players = Some(players);
        self
    }
}

/// A key that is present is kept, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Accepts integers, floats (truncated) and numeric strings; anything else is `None`.
fn epoch_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64),
        _ => None,
    }
}

/// Summary row shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub name: String,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub map_count: usize,
    pub player_count: usize,
    pub is_registered: bool,
}

impl TournamentSummary {
    pub fn for_viewer(tournament: &Tournament, discord_id: &str) -> Self {
        Self {
            name: tournament.name.clone(),
            start_date: tournament.start_date(),
            end_date: tournament.end_date(),
            map_count: tournament.map_ids.len(),
            player_count: tournament.players.len(),
            is_registered: tournament.is_registered(discord_id),
        }
    }
}
