//! Checkout creation and subscription state for the signed-in user.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require_user;
use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    domain::entities::{entitlement::EntitlementStatus, plan::PlanTier},
};

#[derive(Deserialize)]
struct CheckoutRequest {
    price_id: String,
    plan_key: String,
}

#[derive(Serialize)]
struct CheckoutResponse {
    url: String,
}

#[derive(Serialize)]
struct SubscriptionResponse {
    plan: PlanTier,
    status: EntitlementStatus,
    effective_tier: PlanTier,
    has_access: bool,
    expires_at: Option<NaiveDateTime>,
}

/// POST /api/billing/checkout
/// Creates a Stripe checkout session and returns its redirect URL.
async fn create_checkout(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;

    let url = app_state
        .billing_use_cases
        .create_checkout(user_id, &body.price_id, &body.plan_key)
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// GET /api/billing/subscription
/// Returns the user's entitlement, including the tier feature gating applies
/// right now (a lapsed paid plan reads as free here).
async fn get_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&app_state, &headers)?;

    let ent = app_state.billing_use_cases.entitlement_for(user_id).await?;
    let now = Utc::now().naive_utc();

    Ok(Json(SubscriptionResponse {
        plan: ent.plan,
        status: ent.status,
        effective_tier: ent.effective_tier(now),
        has_access: ent.has_access(now),
        expires_at: ent.expires_at,
    }))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/subscription", get(get_subscription))
}
