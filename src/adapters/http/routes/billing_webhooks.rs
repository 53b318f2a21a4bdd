//! Stripe webhook endpoint: signature verification, idempotency, dispatch.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{
        CheckoutCompletedInput, InvoiceInput, SubscriptionDeletedInput, SubscriptionUpdateInput,
    },
    infra::stripe_client::StripeClient,
};
use secrecy::ExposeSecret;

// ============================================================================
// Helper Functions
// ============================================================================

fn timestamp_to_naive(secs: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// Determines if a webhook processing error should trigger a Stripe retry.
///
/// Returns `true` for transient errors, meaning we answer 5xx so Stripe
/// redelivers. Returns `false` for expected conditions (customer not in our
/// system, malformed payload field) where a retry would fail identically; we
/// log and answer 2xx so Stripe stops resending.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::Database(_) => true,
        AppError::Internal(_) => true,
        AppError::Upstream(_) => true,
        AppError::Config(_) => true,

        AppError::NotFound => false,
        AppError::InvalidInput(_) => false,
        AppError::InvalidCredentials => false,
    }
}

// ============================================================================
// Handler
// ============================================================================

/// POST /api/billing/webhook
async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidInput("Missing Stripe signature".into()))?;

    StripeClient::verify_webhook_signature(
        &body,
        signature,
        app_state.config.stripe_webhook_secret.expose_secret(),
    )?;

    let event: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    let event_type = event["type"].as_str().unwrap_or("");
    let event_id = event["id"].as_str().unwrap_or("");

    // Stripe redelivers until it sees a 2xx; a replayed event must not apply
    // its transition twice.
    if app_state
        .billing_use_cases
        .is_event_processed(event_id)
        .await?
    {
        return Ok(Json(serde_json::json!({ "received": true })));
    }

    let result = dispatch_event(&app_state, event_type, event_id, &event).await;

    if let Err(error) = result {
        if is_retryable_error(&error) {
            tracing::error!(
                %error,
                event_type,
                event_id,
                retryable = true,
                "Webhook processing failed, returning 5xx for Stripe retry"
            );
            return Err(error);
        }
        tracing::warn!(
            %error,
            event_type,
            event_id,
            retryable = false,
            "Webhook event skipped"
        );
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

async fn dispatch_event(
    app_state: &AppState,
    event_type: &str,
    event_id: &str,
    event: &serde_json::Value,
) -> AppResult<()> {
    match event_type {
        "checkout.session.completed" => {
            handle_checkout_session_completed(app_state, event, event_id).await
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            handle_subscription_update(app_state, event, event_id).await
        }
        "customer.subscription.deleted" => {
            handle_subscription_deleted(app_state, event, event_id).await
        }
        // invoice.payment_succeeded is the older name some Stripe configs
        // still deliver for the same occurrence.
        "invoice.paid" | "invoice.payment_succeeded" => {
            handle_invoice_paid(app_state, event, event_id).await
        }
        "invoice.payment_failed" => handle_invoice_failed(app_state, event, event_id).await,
        _ => {
            tracing::debug!("Unhandled webhook event type: {}", event_type);
            Ok(())
        }
    }
}

// ============================================================================
// Event Handlers
// ============================================================================

async fn handle_checkout_session_completed(
    app_state: &AppState,
    event: &serde_json::Value,
    event_id: &str,
) -> AppResult<()> {
    let session = &event["data"]["object"];

    let customer_id = match session["customer"].as_str() {
        Some(id) => id,
        None => {
            // One-time payments carry no customer; nothing to reconcile.
            tracing::debug!(event_id, "checkout.session.completed without customer");
            return Ok(());
        }
    };

    let client_reference_id = session["client_reference_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok());

    app_state
        .billing_use_cases
        .apply_checkout_completed(CheckoutCompletedInput {
            stripe_event_id: event_id.to_string(),
            customer_id: customer_id.to_string(),
            subscription_id: session["subscription"].as_str().map(str::to_string),
            client_reference_id,
            customer_email: session["customer_details"]["email"]
                .as_str()
                .map(str::to_string),
            // The session payload has no price or status; the use case fills
            // them from the subscription it references.
            price_id: None,
            provider_status: None,
            current_period_end: None,
            payload: event.clone(),
        })
        .await
}

async fn handle_subscription_update(
    app_state: &AppState,
    event: &serde_json::Value,
    event_id: &str,
) -> AppResult<()> {
    let subscription = &event["data"]["object"];

    let price_id = subscription["items"]["data"]
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item["price"]["id"].as_str());

    app_state
        .billing_use_cases
        .apply_subscription_update(SubscriptionUpdateInput {
            stripe_event_id: event_id.to_string(),
            customer_id: subscription["customer"].as_str().unwrap_or("").to_string(),
            subscription_id: subscription["id"].as_str().unwrap_or("").to_string(),
            provider_status: subscription["status"].as_str().unwrap_or("").to_string(),
            price_id: price_id.map(str::to_string),
            current_period_end: subscription["current_period_end"]
                .as_i64()
                .and_then(timestamp_to_naive),
            cancel_at_period_end: subscription["cancel_at_period_end"]
                .as_bool()
                .unwrap_or(false),
            customer_email: None,
            payload: event.clone(),
        })
        .await
}

async fn handle_subscription_deleted(
    app_state: &AppState,
    event: &serde_json::Value,
    event_id: &str,
) -> AppResult<()> {
    let subscription = &event["data"]["object"];

    app_state
        .billing_use_cases
        .apply_subscription_deleted(
            SubscriptionDeletedInput {
                stripe_event_id: event_id.to_string(),
                customer_id: subscription["customer"].as_str().unwrap_or("").to_string(),
                subscription_id: subscription["id"].as_str().unwrap_or("").to_string(),
                current_period_end: subscription["current_period_end"]
                    .as_i64()
                    .and_then(timestamp_to_naive),
                customer_email: None,
                payload: event.clone(),
            },
            Utc::now().naive_utc(),
        )
        .await
}

async fn handle_invoice_paid(
    app_state: &AppState,
    event: &serde_json::Value,
    event_id: &str,
) -> AppResult<()> {
    let invoice = &event["data"]["object"];

    app_state
        .billing_use_cases
        .apply_invoice_paid(InvoiceInput {
            stripe_event_id: event_id.to_string(),
            customer_id: invoice["customer"].as_str().unwrap_or("").to_string(),
            amount_cents: invoice["amount_paid"].as_i64(),
            period_end: invoice["lines"]["data"]
                .as_array()
                .and_then(|lines| lines.first())
                .and_then(|line| line["period"]["end"].as_i64())
                .and_then(timestamp_to_naive),
            customer_email: invoice["customer_email"].as_str().map(str::to_string),
            payload: event.clone(),
        })
        .await
}

async fn handle_invoice_failed(
    app_state: &AppState,
    event: &serde_json::Value,
    event_id: &str,
) -> AppResult<()> {
    let invoice = &event["data"]["object"];

    app_state
        .billing_use_cases
        .apply_invoice_failed(InvoiceInput {
            stripe_event_id: event_id.to_string(),
            customer_id: invoice["customer"].as_str().unwrap_or("").to_string(),
            amount_cents: invoice["amount_due"].as_i64(),
            period_end: None,
            customer_email: invoice["customer_email"].as_str().map(str::to_string),
            payload: event.clone(),
        })
        .await
}

// ============================================================================
// Router
// ============================================================================

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

// ============================================================================
// Tests
// ============================================================================
