//! Workflow Controller
//!
//! Drives one user's browse session through
//! `Listing -> Detail -> ConfirmingWithdraw -> Detail` (and the admin form
//! states), choosing the surface to render from the viewer's capability and
//! registration state.
//!
//! Sessions live in memory. Each one has its own async mutex, so inputs for a
//! session are applied one at a time while different sessions run freely.
//! A session that sees no input for `session_timeout` accepts nothing more.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::form_service::{FormService, TournamentForm};
use super::lifecycle;
use super::lookup::ProfileDirectory;
use super::registration_service::RegistrationService;
use crate::api_error::ApiError;
use crate::models::tournament::{Tournament, TournamentSummary};
use crate::models::workflow::*;
use crate::store::TournamentStore;

pub const CONFIRMATION_WORD: &str = "CONFIRM";
pub const LINK_ACCOUNT_NOTICE: &str =
    "Discord not linked in beatleader, go [link it](https://beatleader.com/signin/socials)";
pub const CANCELLED_NOTICE: &str = "Action cancelled. Confirmation text did not match.";
pub const SAVED_NOTICE: &str = "Changes saved successfully";

/// One user input, with its parameters.
#[derive(Debug, Clone)]
pub enum Interaction {
    Select { name: String },
    Back,
    Join,
    Withdraw,
    Confirm { text: String },
    Edit,
    Create,
    SubmitForm(TournamentForm),
}

impl Interaction {
    pub fn action(&self) -> WorkflowAction {
        match self {
            Interaction::Select { .. } => WorkflowAction::Select,
            Interaction::Back => WorkflowAction::Back,
            Interaction::Join => WorkflowAction::Join,
            Interaction::Withdraw => WorkflowAction::Withdraw,
            Interaction::Confirm { .. } => WorkflowAction::Confirm,
            Interaction::Edit => WorkflowAction::Edit,
            Interaction::Create => WorkflowAction::Create,
            Interaction::SubmitForm(_) => WorkflowAction::SubmitForm,
        }
    }
}

/// Trimmed, case-insensitive match against the confirmation word.
pub fn is_confirmation(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(CONFIRMATION_WORD)
}

#[derive(Debug)]
struct Session {
    owner: String,
    state: WorkflowState,
    last_activity: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let idle = now.signed_duration_since(self.last_activity);
        idle.to_std().map(|idle| idle >= timeout).unwrap_or(false)
    }
}

pub struct WorkflowService<P> {
    store: TournamentStore,
    registrations: RegistrationService,
    forms: FormService,
    profiles: P,
    session_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl<P: ProfileDirectory> WorkflowService<P> {
    pub fn new(
        store: TournamentStore,
        registrations: RegistrationService,
        forms: FormService,
        profiles: P,
        session_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registrations,
            forms,
            profiles,
            session_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The profile directory joins resolve against.
    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    // =============================================================================
    // ENTRY POINT
    // =============================================================================

    /// Open a new browse session in the `Listing` state.
    pub async fn browse(&self, actor: &Actor) -> Result<WorkflowResponse, ApiError> {
        self.browse_at(actor, Utc::now()).await
    }

    pub(crate) async fn browse_at(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<WorkflowResponse, ApiError> {
        let surface = self.listing_surface(actor, None).await?;
        let session_id = Uuid::new_v4();
        let session = Session {
            owner: actor.user_id.clone(),
            state: WorkflowState::Listing,
            last_activity: now,
        };
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::new(Mutex::new(session)));

        info!(
            session_id = %session_id,
            user_id = %actor.user_id,
            is_administrator = actor.is_administrator,
            "Opened tournament browse session"
        );

        Ok(WorkflowResponse {
            session_id,
            state: WorkflowState::Listing,
            surface,
        })
    }

    // =============================================================================
    // TRANSITIONS
    // =============================================================================

    /// Apply one interaction to a session and return what to render next.
    ///
    /// On error the session keeps its previous state.
    pub async fn handle(
        &self,
        session_id: Uuid,
        actor: &Actor,
        interaction: Interaction,
    ) -> Result<WorkflowResponse, ApiError> {
        self.handle_at(session_id, actor, interaction, Utc::now()).await
    }

    pub(crate) async fn handle_at(
        &self,
        session_id: Uuid,
        actor: &Actor,
        interaction: Interaction,
        now: DateTime<Utc>,
    ) -> Result<WorkflowResponse, ApiError> {
        let entry = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Session not found"))?;
        let mut session = entry.lock().await;

        if session.owner != actor.user_id {
            warn!(session_id = %session_id, user_id = %actor.user_id, "Foreign session access");
            return Err(ApiError::forbidden("This session belongs to another user"));
        }
        if session.is_expired(now, self.session_timeout) {
            drop(session);
            self.sessions.write().await.remove(&session_id);
            debug!(session_id = %session_id, "Rejected input for expired session");
            return Err(ApiError::SessionExpired);
        }

        let action = interaction.action();
        if !session.state.accepts(action) {
            return Err(ApiError::invalid_transition(format!(
                "{:?} is not available in {:?}",
                action, session.state
            )));
        }
        session.last_activity = now;

        let (next, surface) = self.apply(&session.state, actor, interaction, now).await?;

        if next != session.state {
            info!(
                session_id = %session_id,
                from_state = ?session.state,
                to_state = ?next,
                "Workflow transition"
            );
        }
        session.state = next.clone();

        Ok(WorkflowResponse {
            session_id,
            state: next,
            surface,
        })
    }

    async fn apply(
        &self,
        state: &WorkflowState,
        actor: &Actor,
        interaction: Interaction,
        now: DateTime<Utc>,
    ) -> Result<(WorkflowState, Surface), ApiError> {
        match (state, interaction) {
            (WorkflowState::Listing, Interaction::Select { name }) => {
                let tournament = self.store.find_by_name(&name).await?;
                let surface = detail_surface(&tournament, actor, None);
                Ok((WorkflowState::Detail { tournament: name }, surface))
            }
            (WorkflowState::Listing, Interaction::Create) => {
                require_administrator(actor)?;
                Ok((
                    WorkflowState::Form {
                        mode: FormMode::Create,
                        tournament: None,
                    },
                    self.forms.create_form(now),
                ))
            }
            (WorkflowState::Detail { .. }, Interaction::Back) => {
                Ok((WorkflowState::Listing, self.listing_surface(actor, None).await?))
            }
            (WorkflowState::Detail { tournament }, Interaction::Join) => {
                self.join(tournament, actor).await
            }
            (WorkflowState::Detail { tournament }, Interaction::Withdraw) => {
                let current = self.store.find_by_name(tournament).await?;
                if !current.is_registered(&actor.user_id) {
                    return Err(ApiError::invalid_transition(
                        "You are not registered for this tournament",
                    ));
                }
                let surface = Surface::ConfirmWithdraw {
                    tournament: tournament.clone(),
                    label: format!("Type \"{CONFIRMATION_WORD}\" to proceed"),
                    placeholder: format!(
                        "Are you sure you want to withdraw from the tournament \"{tournament}\"?"
                    ),
                };
                Ok((
                    WorkflowState::ConfirmingWithdraw {
                        tournament: tournament.clone(),
                    },
                    surface,
                ))
            }
            (WorkflowState::ConfirmingWithdraw { tournament }, Interaction::Confirm { text }) => {
                let detail = WorkflowState::Detail {
                    tournament: tournament.clone(),
                };
                if !is_confirmation(&text) {
                    info!(tournament = %tournament, user_id = %actor.user_id, "Withdrawal cancelled");
                    let current = self.store.find_by_name(tournament).await?;
                    let surface = detail_surface(&current, actor, Some(CANCELLED_NOTICE.to_string()));
                    return Ok((detail, surface));
                }
                let updated = self.registrations.withdraw(tournament, &actor.user_id).await?;
                let notice = format!("You have withdrawn from the tournament '{tournament}'.");
                Ok((detail, detail_surface(&updated, actor, Some(notice))))
            }
            (WorkflowState::Detail { tournament }, Interaction::Edit) => {
                require_administrator(actor)?;
                let current = self.store.find_by_name(tournament).await?;
                Ok((
                    WorkflowState::Form {
                        mode: FormMode::Edit,
                        tournament: Some(tournament.clone()),
                    },
                    self.forms.edit_form(&current, now),
                ))
            }
            (WorkflowState::Form { mode, tournament }, Interaction::SubmitForm(form)) => {
                require_administrator(actor)?;
                let saved = self.forms.submit(form, *mode, tournament.as_deref()).await?;
                match mode {
                    FormMode::Edit => Ok((
                        WorkflowState::Detail {
                            tournament: saved.name.clone(),
                        },
                        detail_surface(&saved, actor, Some(SAVED_NOTICE.to_string())),
                    )),
                    FormMode::Create => Ok((
                        WorkflowState::Listing,
                        self.listing_surface(actor, Some(SAVED_NOTICE.to_string()))
                            .await?,
                    )),
                }
            }
            (state, interaction) => Err(ApiError::invalid_transition(format!(
                "{:?} is not available in {:?}",
                interaction.action(),
                state
            ))),
        }
    }

    async fn join(
        &self,
        tournament: &str,
        actor: &Actor,
    ) -> Result<(WorkflowState, Surface), ApiError> {
        let detail = WorkflowState::Detail {
            tournament: tournament.to_string(),
        };
        let current = self.store.find_by_name(tournament).await?;
        if current.is_registered(&actor.user_id) {
            return Err(ApiError::invalid_transition(
                "You are already registered for this tournament",
            ));
        }

        let Some(profile) = self.profiles.resolve_profile(&actor.user_id).await? else {
            info!(user_id = %actor.user_id, "Join refused, account not linked");
            let surface = detail_surface(&current, actor, Some(LINK_ACCOUNT_NOTICE.to_string()));
            return Ok((detail, surface));
        };

        let updated = self
            .registrations
            .join(tournament, &actor.user_id, &profile.name)
            .await?;
        let notice = format!("You have joined the tournament '{tournament}'.");
        Ok((detail, detail_surface(&updated, actor, Some(notice))))
    }

    async fn listing_surface(
        &self,
        actor: &Actor,
        notice: Option<String>,
    ) -> Result<Surface, ApiError> {
        let tournaments = lifecycle::list_all(self.store.load_all().await?);
        let title = if tournaments.len() > 1 {
            "Scheduled tournaments overview"
        } else {
            "Tournament details"
        };
        let notice = notice.or_else(|| {
            tournaments
                .is_empty()
                .then(|| "No tournaments registered.".to_string())
        });
        Ok(Surface::Listing {
            title: title.to_string(),
            tournaments: tournaments
                .iter()
                .map(|t| TournamentSummary::for_viewer(t, &actor.user_id))
                .collect(),
            can_create: actor.is_administrator,
            notice,
        })
    }

    // =============================================================================
    // SESSION HOUSEKEEPING
    // =============================================================================

    /// Drop every idle session past the timeout. Sessions busy with an input are kept.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    pub(crate) async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => !session.is_expired(now, self.session_timeout),
            Err(_) => true,
        });
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, remaining = sessions.len(), "Purged expired sessions");
        }
        purged
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn require_administrator(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_administrator {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only administrators can manage tournaments"))
    }
}

/// Detail view for one tournament as seen by `actor`.
fn detail_surface(tournament: &Tournament, actor: &Actor, notice: Option<String>) -> Surface {
    let summary = TournamentSummary::for_viewer(tournament, &actor.user_id);
    Surface::Detail {
        actions: DetailActions::for_viewer(summary.is_registered, actor.is_administrator),
        tournament: summary,
        players: tournament.players.clone(),
        notice,
    }
}
