use actix_web::{web, App, HttpServer};
use chrono::Utc;
use tokio::signal;
use tokio::sync::RwLock;

mod api_error;
mod config;
mod http;
mod models;
mod service;
mod store;
mod telemetry;

use crate::config::Config;
use crate::http::health::HealthState;
use crate::http::tournament_handler::{configure_routes, spawn_session_sweeper, AppState};
use crate::service::{
    BeatLeaderService, BeatSaverService, CommandRegistry, FormService, PlaylistService,
    RegistrationService, WorkflowService,
};
use crate::store::TournamentStore;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize telemetry
    init_telemetry(&config.server.rust_log);

    let store = TournamentStore::new(config.storage.tournaments_file.clone());
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let workflow = WorkflowService::new(
        store.clone(),
        RegistrationService::new(store.clone()),
        FormService::new(store.clone(), config.workflow.timezone),
        BeatLeaderService::new(client.clone(), config.lookups.beatleader_url.clone()),
        config.workflow.session_timeout,
    );
    let playlists = PlaylistService::new(
        store.clone(),
        BeatSaverService::new(client, config.lookups.beatsaver_url.clone()),
    );
    let state = web::Data::new(AppState {
        workflow,
        playlists,
        store: store.clone(),
        commands: RwLock::new(CommandRegistry::builtin()),
    });
    let health = web::Data::new(HealthState {
        store: store.clone(),
        online_since: Utc::now(),
    });

    // Drop sessions nobody has touched within the timeout
    spawn_session_sweeper(state.clone(), config.workflow.sweep_interval);

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        tournaments_file = %store.path().display(),
        timezone = %config.workflow.timezone,
        "Starting tournament registry server"
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(health.clone())
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure_routes::<BeatLeaderService, BeatSaverService>)
            .route(
                "/api/health",
                web::get().to(crate::http::health::health_check),
            )
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run();

    // Graceful shutdown
    let server_handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
