pub mod bankroll;
pub mod billing;
pub mod billing_webhooks;

use axum::Router;
use axum::http::{HeaderMap, header};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing::router().merge(billing_webhooks::router()))
        .nest("/bankroll", bankroll::router())
}

/// Resolve the authenticated user from the bearer token, or 401.
pub(crate) fn require_user(app_state: &AppState, headers: &HeaderMap) -> AppResult<Uuid> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidCredentials)?;
    let claims = jwt::verify(token, &app_state.config.jwt_secret)?;
    Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidCredentials)
}
