use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api_error::ApiError;
use crate::models::tournament::{Tournament, TournamentPatch};
use crate::models::workflow::{FormMode, Surface};
use crate::store::TournamentStore;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const INVALID_DATE_MESSAGE: &str = "Invalid date format. Please use YYYY-MM-DD HH:MM.";

/// Raw create/edit form submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TournamentForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 50))]
    pub start_time: String,
    #[validate(length(max = 50))]
    pub end_time: String,
}

/// Validates create/edit input and writes the tournament window.
#[derive(Clone)]
pub struct FormService {
    store: TournamentStore,
    timezone: Tz,
}

impl FormService {
    pub fn new(store: TournamentStore, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Blank create form with both times defaulting to now.
    pub fn create_form(&self, now: DateTime<Utc>) -> Surface {
        let now = now.with_timezone(&self.timezone).format(DATE_TIME_FORMAT).to_string();
        Surface::Form {
            mode: FormMode::Create,
            name: String::new(),
            start_time: now.clone(),
            end_time: now,
        }
    }

    /// Edit form pre-filled from the stored record.
    pub fn edit_form(&self, tournament: &Tournament, now: DateTime<Utc>) -> Surface {
        let fallback = now.timestamp();
        Surface::Form {
            mode: FormMode::Edit,
            name: tournament.name.clone(),
            start_time: self.format_epoch(tournament.start_date().unwrap_or(fallback)),
            end_time: self.format_epoch(tournament.end_date().unwrap_or(fallback)),
        }
    }

    /// Validate the form and upsert `name`, `startDate` and `endDate`.
    ///
    /// Players and maps are left untouched. Nothing is written on error.
    pub async fn submit(
        &self,
        form: TournamentForm,
        mode: FormMode,
        editing: Option<&str>,
    ) -> Result<Tournament, ApiError> {
        let form = TournamentForm {
            name: form.name.trim().to_string(),
            ..form
        };
        form.validate()?;

        if let (FormMode::Edit, Some(original)) = (mode, editing) {
            if original != form.name {
                return Err(ApiError::validation("Tournament names cannot be changed."));
            }
        }

        let start_date = self.parse_local(&form.start_time)?;
        let end_date = self.parse_local(&form.end_time)?;
        if start_date > end_date {
            return Err(ApiError::validation("End time must not be before start time."));
        }

        let tournament = self
            .store
            .upsert(&form.name, TournamentPatch::window(start_date, end_date))
            .await?;

        info!(
            tournament = %tournament.name,
            mode = ?mode,
            start_date,
            end_date,
            "Tournament window saved"
        );
        Ok(tournament)
    }

    /// `YYYY-MM-DD HH:MM` in the configured zone to epoch seconds.
    pub fn parse_local(&self, value: &str) -> Result<i64, ApiError> {
        let naive = NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT)
            .map_err(|_| ApiError::validation(INVALID_DATE_MESSAGE))?;
        // Ambiguous fall-back times take the earlier instant; spring-forward gaps have none.
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| {
                ApiError::validation(format!(
                    "{} does not exist in {}.",
                    value.trim(),
                    self.timezone.name()
                ))
            })
    }

    pub fn format_epoch(&self, epoch: i64) -> String {
        DateTime::from_timestamp(epoch, 0)
            .map(|dt| dt.with_timezone(&self.timezone).format(DATE_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tournament::Registration;
    use crate::store::tests::temp_store;

    fn service() -> (FormService, TournamentStore) {
        let store = temp_store();
        (FormService::new(store.clone(), chrono_tz::America::Chicago), store)
    }

    fn form(name: &str, start: &str, end: &str) -> TournamentForm {
        TournamentForm {
            name: name.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn test_parse_local_uses_configured_zone() {
        let (service, _) = service();
        // 2025-01-15 12:00 CST is 18:00 UTC.
        let epoch = service.parse_local("2025-01-15 12:00").unwrap();
        assert_eq!(epoch, 1_736_964_000);
        assert_eq!(service.format_epoch(epoch), "2025-01-15 12:00");
    }

    #[test]
    fn test_parse_local_rejects_other_formats() {
        let (service, _) = service();
        for bad in ["2025/01/15 12:00", "2025-01-15", "12:00 2025-01-15", "tomorrow"] {
            let err = service.parse_local(bad).unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(ref m) if m == INVALID_DATE_MESSAGE));
        }
    }

    #[test]
    fn test_parse_local_rejects_spring_forward_gap() {
        let (service, _) = service();
        // Clocks jump from 02:00 to 03:00 on 2025-03-09 in Chicago.
        assert!(service.parse_local("2025-03-09 02:30").is_err());
    }

    #[test]
    fn test_parse_local_picks_earliest_on_fall_back() {
        let (service, _) = service();
        // 01:30 happens twice on 2025-11-02; the CDT one is 06:30 UTC.
        let epoch = service.parse_local("2025-11-02 01:30").unwrap();
        assert_eq!(epoch, 1_762_065_000);
    }

    #[tokio::test]
    async fn test_submit_creates_tournament() {
        let (service, store) = service();
        let created = service
            .submit(form("  Cup1 ", "2025-01-15 12:00", "2025-01-16 12:00"), FormMode::Create, None)
            .await
            .unwrap();

        assert_eq!(created.name, "Cup1");
        let stored = store.find_by_name("Cup1").await.unwrap();
        assert_eq!(stored.start_date(), Some(1_736_964_000));
        assert_eq!(stored.end_date(), Some(1_736_964_000 + 86_400));
    }

    #[tokio::test]
    async fn test_invalid_date_writes_nothing() {
        let (service, store) = service();
        let result = service
            .submit(form("Cup1", "15/01/2025", "2025-01-16 12:00"), FormMode::Create, None)
            .await;

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inverted_window_is_rejected() {
        let (service, store) = service();
        let result = service
            .submit(form("Cup1", "2025-01-16 12:00", "2025-01-15 12:00"), FormMode::Create, None)
            .await;

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_or_long_name_is_rejected() {
        let (service, _) = service();
        let blank = service
            .submit(form("   ", "2025-01-15 12:00", "2025-01-16 12:00"), FormMode::Create, None)
            .await;
        assert!(matches!(blank, Err(ApiError::ValidationError(_))));

        let long = service
            .submit(
                form(&"x".repeat(101), "2025-01-15 12:00", "2025-01-16 12:00"),
                FormMode::Create,
                None,
            )
            .await;
        assert!(matches!(long, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_edit_keeps_roster_and_maps() {
        let (service, store) = service();
        store
            .upsert(
                "Cup1",
                TournamentPatch::window(1000, 2000)
                    .with_map_ids(vec!["4aee1".to_string()])
                    .with_players(vec![Registration::new("42", "Alice")]),
            )
            .await
            .unwrap();

        let edited = service
            .submit(
                form("Cup1", "2025-01-15 12:00", "2025-01-16 12:00"),
                FormMode::Edit,
                Some("Cup1"),
            )
            .await
            .unwrap();

        assert_eq!(edited.start_date(), Some(1_736_964_000));
        assert_eq!(edited.map_ids, vec!["4aee1".to_string()]);
        assert_eq!(edited.players.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_cannot_rename() {
        let (service, store) = service();
        store.upsert("Cup1", TournamentPatch::window(1000, 2000)).await.unwrap();

        let result = service
            .submit(
                form("Cup2", "2025-01-15 12:00", "2025-01-16 12:00"),
                FormMode::Edit,
                Some("Cup1"),
            )
            .await;

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_edit_form_prefills_stored_window() {
        let (service, _) = service();
        let cup: Tournament = serde_json::from_value(serde_json::json!({
            "name": "Cup1",
            "startDate": 1_736_964_000
        }))
        .unwrap();
        let now = DateTime::from_timestamp(1_736_964_000 + 3600, 0).unwrap();

        let surface = service.edit_form(&cup, now);
        assert_eq!(
            surface,
            Surface::Form {
                mode: FormMode::Edit,
                name: "Cup1".to_string(),
                start_time: "2025-01-15 12:00".to_string(),
                end_time: "2025-01-15 13:00".to_string(),
            }
        );
    }
}
