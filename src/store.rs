//! Tournament record store
//!
//! One JSON array on disk holds every tournament. Every mutation is a
//! whole-file rewrite: load all, change in memory, write all back.
//!
//! All load-modify-save cycles run inside a single write gate, so two
//! concurrent joins on the same (or different) tournaments cannot drop each
//! other's changes. Files are replaced by rename, so readers never take the
//! gate and never see a half-written file.
//!
//! Entries are held as raw JSON values. Only the record being changed is
//! decoded and re-encoded; every other entry is written back as it was read.

use crate::models::tournament::{Tournament, TournamentPatch};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Tournament '{0}' not found.")]
    NotFound(String),

    #[error("startDate and endDate are required for new tournaments.")]
    MissingWindow,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed tournament store. Cheap to clone; clones share the write gate.
#[derive(Debug, Clone)]
pub struct TournamentStore {
    path: PathBuf,
    write_gate: Arc<Mutex<()>>,
}

enum Loaded {
    Records(Vec<Value>),
    Unusable(String),
}

impl TournamentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every tournament. An absent or unparsable file is reset to `[]`.
    ///
    /// Entries that are not tournament records are skipped here but stay in the file.
    pub async fn load_all(&self) -> Result<Vec<Tournament>, StoreError> {
        let records = match self.read().await? {
            Loaded::Records(records) => records,
            Loaded::Unusable(_) => {
                let _guard = self.write_gate.lock().await;
                self.load_for_write().await?
            }
        };

        Ok(records
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(tournament) => Some(tournament),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable tournament entry");
                    None
                }
            })
            .collect())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Tournament, StoreError> {
        self.load_all()
            .await?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Merge the supplied fields into the named record, or create it.
    ///
    /// Creating requires both `start_date` and `end_date`; `map_ids` and
    /// `players` default to empty.
    pub async fn upsert(
        &self,
        name: &str,
        patch: TournamentPatch,
    ) -> Result<Tournament, StoreError> {
        let _guard = self.write_gate.lock().await;
        let mut records = self.load_for_write().await?;

        let stored = match records.iter_mut().find(|r| record_name(r) == Some(name)) {
            Some(record) => {
                let mut existing: Tournament = serde_json::from_value(record.clone())?;
                existing.apply(patch);
                *record = serde_json::to_value(&existing)?;
                existing
            }
            None => {
                let (Some(start_date), Some(end_date)) = (patch.start_date, patch.end_date) else {
                    return Err(StoreError::MissingWindow);
                };
                let mut created = Tournament::new(name, start_date, end_date);
                created.map_ids = patch.map_ids.unwrap_or_default();
                created.players = patch.players.unwrap_or_default();
                info!(tournament = %name, "Creating tournament record");
                records.push(serde_json::to_value(&created)?);
                created
            }
        };

        self.persist(&records).await?;
        debug!(tournament = %name, "Tournament upserted");
        Ok(stored)
    }

    /// Run `mutate` against the current stored record and persist the result
    /// as one step. Nothing is written if the record does not exist.
    pub async fn update<F>(&self, name: &str, mutate: F) -> Result<Tournament, StoreError>
    where
        F: FnOnce(&mut Tournament),
    {
        let _guard = self.write_gate.lock().await;
        let mut records = self.load_for_write().await?;

        let record = records
            .iter_mut()
            .find(|r| record_name(r) == Some(name))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let mut updated: Tournament = serde_json::from_value(record.clone())?;
        mutate(&mut updated);
        *record = serde_json::to_value(&updated)?;

        self.persist(&records).await?;
        Ok(updated)
    }

    /// Only called with the write gate held.
    async fn load_for_write(&self) -> Result<Vec<Value>, StoreError> {
        match self.read().await? {
            Loaded::Records(records) => Ok(records),
            Loaded::Unusable(reason) => {
                self.reinitialize(&reason).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn read(&self) -> Result<Loaded, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Loaded::Unusable("file does not exist".to_string()))
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Ok(Loaded::Unusable(format!("file is not UTF-8: {e}")))
            }
            Err(e) => return Err(e.into()),
        };

        let data = data.trim();
        if data.is_empty() {
            return Ok(Loaded::Records(Vec::new()));
        }
        match serde_json::from_str(data) {
            Ok(records) => Ok(Loaded::Records(records)),
            Err(e) => Ok(Loaded::Unusable(format!("file is not a tournament list: {e}"))),
        }
    }

    async fn reinitialize(&self, reason: &str) -> Result<(), StoreError> {
        if tokio::fs::try_exists(&self.path).await? {
            let backup = self.sibling("corrupt");
            warn!(
                path = %self.path.display(),
                backup = %backup.display(),
                reason = reason,
                "Tournament file unusable, moving it aside and starting empty"
            );
            tokio::fs::rename(&self.path, &backup).await?;
        } else {
            info!(path = %self.path.display(), "Initializing empty tournament file");
        }
        self.persist(&[]).await
    }

    async fn persist(&self, records: &[Value]) -> Result<(), StoreError> {
        let json = to_pretty_json(records)?;
        let tmp = self.sibling("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(extension);
        self.path.with_file_name(name)
    }
}

fn record_name(record: &Value) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

/// Four-space indented JSON.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::tournament::Registration;
    use tokio_test::{assert_err, assert_ok};

    pub(crate) fn temp_store() -> TournamentStore {
        let path = std::env::temp_dir().join(format!(
            "tournament-registry-{}.json",
            uuid::Uuid::new_v4()
        ));
        TournamentStore::new(path)
    }

    fn alice() -> Registration {
        Registration::new("42", "Alice")
    }

    #[tokio::test]
    async fn test_missing_file_is_initialized_empty() {
        let store = temp_store();
        let all = store.load_all().await.unwrap();
        assert!(all.is_empty());

        let on_disk = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(on_disk.trim(), "[]");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reset_and_backed_up() {
        let store = temp_store();
        tokio::fs::write(store.path(), "{ not json").await.unwrap();

        let all = store.load_all().await.unwrap();
        assert!(all.is_empty());

        let on_disk = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(on_disk.trim(), "[]");
        let backup = tokio::fs::read_to_string(store.sibling("corrupt")).await.unwrap();
        assert_eq!(backup, "{ not json");
    }

    #[tokio::test]
    async fn test_blank_file_reads_as_empty() {
        let store = temp_store();
        tokio::fs::write(store.path(), "  \n").await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let store = temp_store();
        let err = store.find_by_name("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_create_requires_window() {
        let store = temp_store();
        let result = store
            .upsert(
                "Cup1",
                TournamentPatch {
                    start_date: Some(1000),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::MissingWindow)));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_defaults_maps_and_players() {
        let store = temp_store();
        assert_ok!(store.upsert("Cup1", TournamentPatch::window(1000, 2000)).await);

        let cup = store.find_by_name("Cup1").await.unwrap();
        assert_eq!(cup.start_date(), Some(1000));
        assert_eq!(cup.end_date(), Some(2000));
        assert!(cup.map_ids.is_empty());
        assert!(cup.players.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_merges_only_supplied_fields() {
        let store = temp_store();
        store
            .upsert(
                "Cup1",
                TournamentPatch::window(1000, 2000)
                    .with_map_ids(vec!["4aee1".to_string()])
                    .with_players(vec![alice()]),
            )
            .await
            .unwrap();

        store
            .upsert(
                "Cup1",
                TournamentPatch {
                    end_date: Some(3000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let cup = store.find_by_name("Cup1").await.unwrap();
        assert_eq!(cup.start_date(), Some(1000));
        assert_eq!(cup.end_date(), Some(3000));
        assert_eq!(cup.map_ids, vec!["4aee1".to_string()]);
        assert_eq!(cup.players, vec![alice()]);
    }

    #[tokio::test]
    async fn test_upsert_same_name_keeps_one_record() {
        let store = temp_store();
        store.upsert("Cup1", TournamentPatch::window(1000, 2000)).await.unwrap();
        store.upsert("Cup1", TournamentPatch::window(1500, 2000)).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].start_date(), Some(1500));
    }

    #[tokio::test]
    async fn test_update_missing_record_writes_nothing() {
        let store = temp_store();
        store.upsert("Cup1", TournamentPatch::window(1000, 2000)).await.unwrap();
        let before = tokio::fs::read_to_string(store.path()).await.unwrap();

        assert_err!(store.update("Cup2", |t| t.players.clear()).await);

        let after = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_file_is_pretty_printed_with_original_field_names() {
        let store = temp_store();
        store.upsert("Cup1", TournamentPatch::window(1000, 2000)).await.unwrap();

        let on_disk = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(on_disk.contains("\n        \"name\": \"Cup1\""));
        assert!(on_disk.contains("\"startDate\": 1000"));
        assert!(on_disk.contains("\"mapIds\": []"));
    }

    #[tokio::test]
    async fn test_untouched_records_survive_rewrite() {
        let store = temp_store();
        tokio::fs::write(
            store.path(),
            r#"[{"name": "Old", "startDate": 10, "endDate": 20, "mapIds": ["a"], "players": []}]"#,
        )
        .await
        .unwrap();

        store.upsert("New", TournamentPatch::window(1000, 2000)).await.unwrap();

        let old = store.find_by_name("Old").await.unwrap();
        assert_eq!(old.map_ids, vec!["a".to_string()]);
        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_join_elsewhere_leaves_odd_record_unchanged() {
        let store = temp_store();
        tokio::fs::write(
            store.path(),
            r#"[
                {"name": "Old", "startDate": "soon", "endDate": 1000.7, "notes": "keep me"},
                {"name": "Cup1", "startDate": 1000, "endDate": 2000, "mapIds": [], "players": []}
            ]"#,
        )
        .await
        .unwrap();

        store
            .update("Cup1", |t| {
                t.add_player(alice());
            })
            .await
            .unwrap();

        let on_disk = tokio::fs::read_to_string(store.path()).await.unwrap();
        let records: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(
            records[0],
            serde_json::json!({
                "name": "Old",
                "startDate": "soon",
                "endDate": 1000.7,
                "notes": "keep me"
            })
        );
        assert_eq!(records[1]["players"][0]["discordId"], "42");
        assert!(on_disk.contains("\"endDate\": 1000.7"));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_skipped_but_kept() {
        let store = temp_store();
        tokio::fs::write(
            store.path(),
            r#"[{"title": "no name"}, {"name": "Cup1", "startDate": 1000, "endDate": 2000}]"#,
        )
        .await
        .unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);

        store.update("Cup1", |t| t.map_ids.push("1a".to_string())).await.unwrap();
        let on_disk = tokio::fs::read_to_string(store.path()).await.unwrap();
        let records: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(records[0], serde_json::json!({"title": "no name"}));
    }
}
