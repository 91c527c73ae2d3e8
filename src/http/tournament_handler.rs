use crate::api_error::ApiError;
use crate::models::playlist::Playlist;
use crate::models::profile::ProfileCard;
use crate::models::tournament::TournamentSummary;
use crate::models::workflow::Actor;
use crate::service::command_registry::CommandRegistry;
use crate::service::form_service::TournamentForm;
use crate::service::lifecycle;
use crate::service::lookup::{MapCatalog, ProfileDirectory};
use crate::service::playlist_service::PlaylistService;
use crate::service::workflow_service::{Interaction, WorkflowService};
use crate::store::TournamentStore;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Application state shared by the tournament handlers
pub struct AppState<P, M> {
    pub workflow: WorkflowService<P>,
    pub playlists: PlaylistService<M>,
    pub store: TournamentStore,
    pub commands: RwLock<CommandRegistry>,
}

/// Drop sessions nobody has touched within the timeout, every `interval`.
pub fn spawn_session_sweeper<P, M>(
    state: web::Data<AppState<P, M>>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let purged = state.workflow.purge_expired().await;
            let open_sessions = state.workflow.session_count().await;
            tracing::trace!(purged, open_sessions, "Session sweep finished");
        }
    })
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub actor: Actor,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub actor: Actor,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FormRequest {
    pub actor: Actor,
    pub form: TournamentForm,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub actor: Actor,
    pub playlist: Playlist,
}

#[derive(Debug, Deserialize)]
pub struct CommandSyncRequest {
    pub actor: Actor,
    /// Command name to platform-assigned id.
    pub commands: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active: bool,
    /// Viewer whose registration marks the rows.
    #[serde(default)]
    pub user_id: String,
}

// =============================================================================
// BROWSE SESSION
// =============================================================================

/// POST /api/tournaments/browse
/// Open a browse session in the Listing state
pub async fn browse<P, M>(
    state: web::Data<AppState<P, M>>,
    req: web::Json<ActorRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let response = state.workflow.browse(&req.actor).await?;
    Ok(HttpResponse::Created().json(response))
}

async fn session_input<P, M>(
    state: &AppState<P, M>,
    session_id: Uuid,
    actor: &Actor,
    interaction: Interaction,
) -> Result<HttpResponse, ApiError>
where
    P: ProfileDirectory,
{
    let response = state.workflow.handle(session_id, actor, interaction).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/sessions/:id/select
pub async fn select<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<SelectRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let SelectRequest { actor, name } = req.into_inner();
    session_input(&state, path.into_inner(), &actor, Interaction::Select { name }).await
}

/// POST /api/sessions/:id/back
pub async fn back<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<ActorRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    session_input(&state, path.into_inner(), &req.actor, Interaction::Back).await
}

/// POST /api/sessions/:id/join
pub async fn join<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<ActorRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    session_input(&state, path.into_inner(), &req.actor, Interaction::Join).await
}

/// POST /api/sessions/:id/withdraw
/// Ask for the confirmation word before withdrawing
pub async fn withdraw<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<ActorRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    session_input(&state, path.into_inner(), &req.actor, Interaction::Withdraw).await
}

/// POST /api/sessions/:id/confirm
pub async fn confirm<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<ConfirmRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let ConfirmRequest { actor, text } = req.into_inner();
    session_input(&state, path.into_inner(), &actor, Interaction::Confirm { text }).await
}

/// POST /api/sessions/:id/edit
pub async fn edit<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<ActorRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    session_input(&state, path.into_inner(), &req.actor, Interaction::Edit).await
}

/// POST /api/sessions/:id/create
pub async fn create<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<ActorRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    session_input(&state, path.into_inner(), &req.actor, Interaction::Create).await
}

/// POST /api/sessions/:id/form
pub async fn submit_form<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<Uuid>,
    req: web::Json<FormRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let FormRequest { actor, form } = req.into_inner();
    session_input(&state, path.into_inner(), &actor, Interaction::SubmitForm(form)).await
}

// =============================================================================
// LISTING
// =============================================================================

/// GET /api/tournaments?active=true&user_id=...
pub async fn list_tournaments<P, M>(
    state: web::Data<AppState<P, M>>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let tournaments = state.store.load_all().await?;
    let tournaments = if query.active {
        lifecycle::list_active(tournaments, Utc::now().timestamp())
    } else {
        lifecycle::list_all(tournaments)
    };

    let summaries: Vec<TournamentSummary> = tournaments
        .iter()
        .map(|t| TournamentSummary::for_viewer(t, &query.user_id))
        .collect();
    Ok(HttpResponse::Ok().json(summaries))
}

// =============================================================================
// PROFILE
// =============================================================================

/// GET /api/profile?user_id=...
/// The caller's BeatLeader account, or how to link one
pub async fn my_profile<P, M>(
    state: web::Data<AppState<P, M>>,
    query: web::Query<ProfileQuery>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    if query.user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }
    let profile = state
        .workflow
        .profiles()
        .resolve_profile(&query.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(ProfileCard::from_lookup(profile)))
}

// =============================================================================
// PLAYLIST IMPORT
// =============================================================================

/// POST /api/tournaments/:name/playlist
/// Replace a tournament's maps with the songs of a playlist
pub async fn import_playlist<P, M>(
    state: web::Data<AppState<P, M>>,
    path: web::Path<String>,
    req: web::Json<PlaylistRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let PlaylistRequest { actor, playlist } = req.into_inner();
    if !actor.is_administrator {
        return Err(ApiError::forbidden("Only administrators can import playlists"));
    }
    let name = path.into_inner();

    info!(
        tournament = %name,
        user_id = %actor.user_id,
        songs = playlist.songs.len(),
        "Received playlist import request"
    );

    let report = state.playlists.import(&name, playlist).await?;
    Ok(HttpResponse::Ok().json(report))
}

// =============================================================================
// COMMANDS
// =============================================================================

/// GET /api/commands
pub async fn list_commands<P, M>(state: web::Data<AppState<P, M>>) -> impl Responder
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    let registry = state.commands.read().await;
    HttpResponse::Ok().json(serde_json::json!({
        "commands": registry.commands(),
        "mentions": registry.format_mentions(),
    }))
}

/// POST /api/commands/sync
/// Record the ids the chat platform assigned to our commands
pub async fn sync_commands<P, M>(
    state: web::Data<AppState<P, M>>,
    req: web::Json<CommandSyncRequest>,
) -> Result<impl Responder, ApiError>
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    if !req.actor.is_administrator {
        return Err(ApiError::forbidden("Only administrators can sync commands"));
    }
    if req.commands.is_empty() {
        return Err(ApiError::bad_request("No command ids supplied"));
    }

    let mut registry = state.commands.write().await;
    let matched = registry.apply_sync(&req.commands);
    info!(matched, supplied = req.commands.len(), "Synced command ids");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "matched": matched,
        "mentions": registry.format_mentions(),
    })))
}

// =============================================================================
// ROUTE CONFIGURATION
// =============================================================================

/// Configure tournament, session, profile and command routes
pub fn configure_routes<P, M>(cfg: &mut web::ServiceConfig)
where
    P: ProfileDirectory + 'static,
    M: MapCatalog + 'static,
{
    cfg.service(
        web::scope("/api/tournaments")
            .route("", web::get().to(list_tournaments::<P, M>))
            .route("/browse", web::post().to(browse::<P, M>))
            .route("/{name}/playlist", web::post().to(import_playlist::<P, M>)),
    )
    .service(
        web::scope("/api/sessions")
            .route("/{id}/select", web::post().to(select::<P, M>))
            .route("/{id}/back", web::post().to(back::<P, M>))
            .route("/{id}/join", web::post().to(join::<P, M>))
            .route("/{id}/withdraw", web::post().to(withdraw::<P, M>))
            .route("/{id}/confirm", web::post().to(confirm::<P, M>))
            .route("/{id}/edit", web::post().to(edit::<P, M>))
            .route("/{id}/create", web::post().to(create::<P, M>))
            .route("/{id}/form", web::post().to(submit_form::<P, M>)),
    )
    .route("/api/profile", web::get().to(my_profile::<P, M>))
    .service(
        web::scope("/api/commands")
            .route("", web::get().to(list_commands::<P, M>))
            .route("/sync", web::post().to(sync_commands::<P, M>)),
    );
}
