use crate::api_error::ApiError;
use crate::models::tournament::{Registration, Tournament};
use crate::store::TournamentStore;
use tracing::info;

/// Join/withdraw against a tournament roster.
///
/// Each operation is a single `TournamentStore::update`, so the fetch and the
/// write happen inside the store's write gate and concurrent calls cannot
/// overwrite each other's roster changes.
#[derive(Clone)]
pub struct RegistrationService {
    store: TournamentStore,
}

impl RegistrationService {
    pub fn new(store: TournamentStore) -> Self {
        Self { store }
    }

    /// Add the player to the roster. Re-joining is a no-op.
    ///
    /// The caller must already have resolved `discord_id` to a linked profile.
    pub async fn join(
        &self,
        tournament_name: &str,
        discord_id: &str,
        display_name: &str,
    ) -> Result<Tournament, ApiError> {
        let mut added = false;
        let tournament = self
            .store
            .update(tournament_name, |t| {
                added = t.add_player(Registration::new(discord_id, display_name));
            })
            .await?;

        info!(
            tournament = %tournament_name,
            discord_id = %discord_id,
            added,
            players = tournament.players.len(),
            "Processed join"
        );
        Ok(tournament)
    }

    /// Remove the player from the roster. Withdrawing an absent player is a no-op.
    pub async fn withdraw(
        &self,
        tournament_name: &str,
        discord_id: &str,
    ) -> Result<Tournament, ApiError> {
        let mut removed = false;
        let tournament = self
            .store
            .update(tournament_name, |t| {
                removed = t.remove_player(discord_id);
            })
            .await?;

        info!(
            tournament = %tournament_name,
            discord_id = %discord_id,
            removed,
            players = tournament.players.len(),
            "Processed withdraw"
        );
        Ok(tournament)
    }
}
