//! Bankroll settings, entries, and the dashboard overview.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::require_user;
use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::use_cases::bankroll::{NewEntryInput, SaveSettingsInput},
    domain::entities::bankroll::EntryStatus,
};

#[derive(Deserialize)]
struct SettleRequest {
    outcome: EntryStatus,
}

/// GET /api/bankroll/settings
/// 404 until the user saves settings for the first time.
async fn get_settings(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;
    let settings = app_state.bankroll_use_cases.get_settings(user_id).await?;
    Ok(Json(settings))
}

/// PUT /api/bankroll/settings
async fn save_settings(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SaveSettingsInput>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;
    let settings = app_state
        .bankroll_use_cases
        .save_settings(user_id, body)
        .await?;
    Ok(Json(settings))
}

/// GET /api/bankroll/entries
async fn list_entries(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;
    let entries = app_state.bankroll_use_cases.list_entries(user_id).await?;
    Ok(Json(entries))
}

/// POST /api/bankroll/entries
/// The per-day quota depends on the plan the user's entitlement grants right
/// now, not the plan on paper.
async fn add_entry(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewEntryInput>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;
    let now = Utc::now().naive_utc();

    let ent = app_state.billing_use_cases.entitlement_for(user_id).await?;
    let tier = ent.effective_tier(now);

    let entry = app_state
        .bankroll_use_cases
        .add_entry(user_id, tier, body, now)
        .await?;
    Ok(Json(entry))
}

/// POST /api/bankroll/entries/{id}/settle
async fn settle_entry(
    State(app_state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<SettleRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;
    let entry = app_state
        .bankroll_use_cases
        .settle_entry(user_id, entry_id, body.outcome)
        .await?;
    Ok(Json(entry))
}

/// GET /api/bankroll/overview
async fn overview(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;
    let now = Utc::now().naive_utc();

    let ent = app_state.billing_use_cases.entitlement_for(user_id).await?;
    let tier = ent.effective_tier(now);

    let overview = app_state
        .bankroll_use_cases
        .overview(user_id, tier, now)
        .await?;
    Ok(Json(overview))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(save_settings))
        .route("/entries", get(list_entries))
        .route("/entries", post(add_entry))
        .route("/entries/{id}/settle", post(settle_entry))
        .route("/overview", get(overview))
}
