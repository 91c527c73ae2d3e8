use serde::{Deserialize, Serialize};

/// Playlist document as exported by the game's playlist tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(default = "default_title")]
    pub playlist_title: String,
    #[serde(default)]
    pub playlist_author: Option<String>,
    #[serde(default)]
    pub songs: Vec<PlaylistSong>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSong {
    pub hash: String,
    #[serde(default)]
    pub song_name: Option<String>,
}

fn default_title() -> String {
    "Playlist".to_string()
}

/// Outcome of importing a playlist into a tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub tournament: String,
    pub playlist_title: String,
    pub map_ids: Vec<String>,
    pub unresolved: Vec<String>,
}
