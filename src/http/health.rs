use actix_web::{web, HttpResponse, Result};
use chrono::{DateTime, Utc};

use crate::api_error::ApiError;
use crate::store::TournamentStore;

/// What the health probe needs: the store to read and when the process came up.
#[derive(Clone)]
pub struct HealthState {
    pub store: TournamentStore,
    pub online_since: DateTime<Utc>,
}

pub async fn health_check(state: web::Data<HealthState>) -> Result<HttpResponse, ApiError> {
    // Check the tournament file is readable
    let tournaments = state.store.load_all().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "store": "ok",
        "tournaments": tournaments.len(),
        "online_since": state.online_since.to_rfc3339(),
    })))
}
