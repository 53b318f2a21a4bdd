use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::price_map::PricePlanMap,
    domain::entities::{
        entitlement::{Entitlement, EntitlementStatus},
        plan::PlanTier,
        user::User,
    },
};

// ============================================================================
// Input Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateSubscriptionEventInput {
    pub user_id: Uuid,
    pub event_type: String,
    pub status: Option<EntitlementStatus>,
    pub plan: Option<PlanTier>,
    pub amount_cents: Option<i64>,
    pub stripe_event_id: Option<String>,
    pub payload: serde_json::Value,
}

/// Fields extracted from a `checkout.session.completed` event.
#[derive(Debug, Clone)]
pub struct CheckoutCompletedInput {
    pub stripe_event_id: String,
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub client_reference_id: Option<Uuid>,
    pub customer_email: Option<String>,
    pub price_id: Option<String>,
    pub provider_status: Option<String>,
    pub current_period_end: Option<NaiveDateTime>,
    pub payload: serde_json::Value,
}

/// Fields extracted from `customer.subscription.created` / `.updated`.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdateInput {
    pub stripe_event_id: String,
    pub customer_id: String,
    pub subscription_id: String,
    pub provider_status: String,
    pub price_id: Option<String>,
    pub current_period_end: Option<NaiveDateTime>,
    pub cancel_at_period_end: bool,
    pub customer_email: Option<String>,
    pub payload: serde_json::Value,
}

/// Fields extracted from `customer.subscription.deleted`.
#[derive(Debug, Clone)]
pub struct SubscriptionDeletedInput {
    pub stripe_event_id: String,
    pub customer_id: String,
    pub subscription_id: String,
    pub current_period_end: Option<NaiveDateTime>,
    pub customer_email: Option<String>,
    pub payload: serde_json::Value,
}

/// Fields extracted from `invoice.paid` / `invoice.payment_failed`.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    pub stripe_event_id: String,
    pub customer_id: String,
    pub amount_cents: Option<i64>,
    pub period_end: Option<NaiveDateTime>,
    pub customer_email: Option<String>,
    pub payload: serde_json::Value,
}

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

#[async_trait]
pub trait EntitlementRepo: Send + Sync {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Entitlement>>;
    async fn get_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<Entitlement>>;
    /// Insert or update by `user_id`, returning the stored row.
    async fn upsert(&self, entitlement: &Entitlement) -> AppResult<Entitlement>;
}

#[async_trait]
pub trait SubscriptionEventRepo: Send + Sync {
    async fn create(&self, input: &CreateSubscriptionEventInput) -> AppResult<()>;
    /// Idempotency check: has a row with this provider event id been written?
    async fn exists_by_stripe_event_id(&self, stripe_event_id: &str) -> AppResult<bool>;
}

/// Subscription fields the reconciler needs, as fetched from the provider.
#[derive(Debug, Clone)]
pub struct GatewaySubscription {
    pub status: String,
    pub price_id: Option<String>,
    pub current_period_end: Option<NaiveDateTime>,
    pub cancel_at_period_end: bool,
}

/// Outbound calls to the payment provider, kept behind a trait so use cases
/// stay testable without network access.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Return an existing customer for this user or create one, carrying the
    /// user id in customer metadata.
    async fn ensure_customer(&self, user_id: Uuid, email: &str) -> AppResult<String>;

    /// Create a subscription-mode checkout session and return its URL.
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        user_id: Uuid,
        plan_key: &str,
    ) -> AppResult<String>;

    /// Fetch the email on file for a customer, used as a last-resort user
    /// lookup when webhook payloads carry no reference back to us.
    async fn customer_email(&self, customer_id: &str) -> AppResult<Option<String>>;

    /// Fetch the current state of a subscription.
    async fn subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct BillingUseCases {
    users: Arc<dyn UserRepo>,
    entitlements: Arc<dyn EntitlementRepo>,
    events: Arc<dyn SubscriptionEventRepo>,
    gateway: Arc<dyn PaymentGateway>,
    prices: PricePlanMap,
}

impl BillingUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        entitlements: Arc<dyn EntitlementRepo>,
        events: Arc<dyn SubscriptionEventRepo>,
        gateway: Arc<dyn PaymentGateway>,
        prices: PricePlanMap,
    ) -> Self {
        Self {
            users,
            entitlements,
            events,
            gateway,
            prices,
        }
    }

    pub async fn is_event_processed(&self, stripe_event_id: &str) -> AppResult<bool> {
        self.events.exists_by_stripe_event_id(stripe_event_id).await
    }

    /// Current entitlement for a user, defaulting to the free tier when no
    /// row exists yet.
    pub async fn entitlement_for(&self, user_id: Uuid) -> AppResult<Entitlement> {
        Ok(self
            .entitlements
            .get_by_user_id(user_id)
            .await?
            .unwrap_or_else(|| Entitlement::free(user_id)))
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    /// Create a Stripe checkout session for a configured price and return
    /// its redirect URL. Reuses the user's existing Stripe customer when one
    /// is on record.
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        price_id: &str,
        plan_key: &str,
    ) -> AppResult<String> {
        if !self.prices.is_known(price_id) {
            return Err(AppError::InvalidInput("Unknown price id".into()));
        }
        if self.prices.plan_for(price_id) != PlanTier::from_str(plan_key) {
            return Err(AppError::InvalidInput(
                "Plan does not match the price id".into(),
            ));
        }

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut entitlement = self.entitlement_for(user_id).await?;
        let customer_id = match entitlement.stripe_customer_id.clone() {
            Some(id) => id,
            None => {
                let id = self.gateway.ensure_customer(user_id, &user.email).await?;
                entitlement.stripe_customer_id = Some(id.clone());
                self.entitlements.upsert(&entitlement).await?;
                id
            }
        };

        self.gateway
            .create_checkout_session(&customer_id, price_id, user_id, plan_key)
            .await
    }

    // ========================================================================
    // Webhook Transitions
    // ========================================================================

    pub async fn apply_checkout_completed(
        &self,
        mut input: CheckoutCompletedInput,
    ) -> AppResult<()> {
        let mut ent = self
            .resolve_entitlement(
                &input.customer_id,
                input.client_reference_id,
                input.customer_email.as_deref(),
            )
            .await?;

        // The checkout session payload carries no price or status; fetch the
        // subscription it created to fill the gaps.
        if input.price_id.is_none() {
            if let Some(sub_id) = input.subscription_id.as_deref() {
                let sub = self.gateway.subscription(sub_id).await?;
                input.price_id = sub.price_id;
                input.provider_status = Some(sub.status);
                if input.current_period_end.is_none() {
                    input.current_period_end = sub.current_period_end;
                }
            }
        }

        ent.plan = self.plan_from_price(input.price_id.as_deref(), ent.plan);
        ent.status = input
            .provider_status
            .as_deref()
            .map(EntitlementStatus::from_stripe)
            .unwrap_or(EntitlementStatus::Active);
        ent.stripe_subscription_id = input.subscription_id.clone();
        if input.current_period_end.is_some() {
            ent.expires_at = input.current_period_end;
        }

        let ent = self.entitlements.upsert(&ent).await?;
        self.record(
            &ent,
            "checkout.session.completed",
            None,
            &input.stripe_event_id,
            &input.payload,
        )
        .await
    }

    pub async fn apply_subscription_update(
        &self,
        input: SubscriptionUpdateInput,
    ) -> AppResult<()> {
        let mut ent = self
            .resolve_entitlement(&input.customer_id, None, input.customer_email.as_deref())
            .await?;

        ent.plan = self.plan_from_price(input.price_id.as_deref(), ent.plan);

        let mut status = EntitlementStatus::from_stripe(&input.provider_status);
        // Scheduled cancellations arrive as a still-active subscription with
        // the flag set; the paid period keeps running until period end.
        if input.cancel_at_period_end
            && matches!(
                status,
                EntitlementStatus::Active | EntitlementStatus::Trialing
            )
        {
            status = EntitlementStatus::Canceled;
        }
        ent.status = status;
        ent.stripe_subscription_id = Some(input.subscription_id.clone());
        if input.current_period_end.is_some() {
            ent.expires_at = input.current_period_end;
        }

        let ent = self.entitlements.upsert(&ent).await?;
        self.record(
            &ent,
            "customer.subscription.updated",
            None,
            &input.stripe_event_id,
            &input.payload,
        )
        .await
    }

    pub async fn apply_subscription_deleted(
        &self,
        input: SubscriptionDeletedInput,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        let mut ent = self
            .resolve_entitlement(&input.customer_id, None, input.customer_email.as_deref())
            .await?;

        ent.stripe_subscription_id = None;
        match input.current_period_end {
            // Deleted mid-period: access runs out at period end.
            Some(end) if now < end => {
                ent.status = EntitlementStatus::Canceled;
                ent.expires_at = Some(end);
            }
            _ => {
                ent.plan = PlanTier::Free;
                ent.status = EntitlementStatus::Expired;
                ent.expires_at = None;
            }
        }

        let ent = self.entitlements.upsert(&ent).await?;
        self.record(
            &ent,
            "customer.subscription.deleted",
            None,
            &input.stripe_event_id,
            &input.payload,
        )
        .await
    }

    pub async fn apply_invoice_paid(&self, input: InvoiceInput) -> AppResult<()> {
        let mut ent = self
            .resolve_entitlement(&input.customer_id, None, input.customer_email.as_deref())
            .await?;

        ent.status = EntitlementStatus::Active;
        if input.period_end.is_some() {
            ent.expires_at = input.period_end;
        }

        let ent = self.entitlements.upsert(&ent).await?;
        self.record(
            &ent,
            "invoice.paid",
            input.amount_cents,
            &input.stripe_event_id,
            &input.payload,
        )
        .await
    }

    /// A failed renewal blocks access but keeps the plan, so a later
    /// successful retry restores it without any plan lookup.
    pub async fn apply_invoice_failed(&self, input: InvoiceInput) -> AppResult<()> {
        let mut ent = self
            .resolve_entitlement(&input.customer_id, None, input.customer_email.as_deref())
            .await?;

        ent.status = EntitlementStatus::PastDue;

        let ent = self.entitlements.upsert(&ent).await?;
        self.record(
            &ent,
            "invoice.payment_failed",
            input.amount_cents,
            &input.stripe_event_id,
            &input.payload,
        )
        .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Find the entitlement a webhook event belongs to.
    ///
    /// Lookup order: stored customer id, then the checkout session's
    /// `client_reference_id`, then the customer email (payload first, Stripe
    /// API as fallback). The customer id is backfilled onto the entitlement
    /// whenever resolution succeeded through a secondary path, so the next
    /// event matches directly.
    async fn resolve_entitlement(
        &self,
        customer_id: &str,
        client_reference_id: Option<Uuid>,
        customer_email: Option<&str>,
    ) -> AppResult<Entitlement> {
        if let Some(ent) = self
            .entitlements
            .get_by_stripe_customer_id(customer_id)
            .await?
        {
            return Ok(ent);
        }

        let user = match client_reference_id {
            Some(user_id) => self.users.get_by_id(user_id).await?,
            None => None,
        };
        let user = match user {
            Some(user) => Some(user),
            None => self.user_by_email(customer_id, customer_email).await?,
        };
        let user = user.ok_or(AppError::NotFound)?;

        let mut ent = self.entitlement_for(user.id).await?;
        ent.stripe_customer_id = Some(customer_id.to_string());
        Ok(ent)
    }

    async fn user_by_email(
        &self,
        customer_id: &str,
        payload_email: Option<&str>,
    ) -> AppResult<Option<User>> {
        let email = match payload_email {
            Some(email) => Some(email.to_string()),
            None => self.gateway.customer_email(customer_id).await?,
        };
        match email {
            Some(email) => self.users.find_by_email(&email).await,
            None => Ok(None),
        }
    }

    fn plan_from_price(&self, price_id: Option<&str>, current: PlanTier) -> PlanTier {
        match price_id {
            Some(price) if self.prices.is_known(price) => self.prices.plan_for(price),
            Some(price) => {
                tracing::warn!(
                    price_id = %price,
                    "Unrecognized Stripe price id, downgrading to free"
                );
                PlanTier::Free
            }
            None => current,
        }
    }

    async fn record(
        &self,
        ent: &Entitlement,
        event_type: &str,
        amount_cents: Option<i64>,
        stripe_event_id: &str,
        payload: &serde_json::Value,
    ) -> AppResult<()> {
        self.events
            .create(&CreateSubscriptionEventInput {
                user_id: ent.user_id,
                event_type: event_type.to_string(),
                status: Some(ent.status),
                plan: Some(ent.plan),
                amount_cents,
                stripe_event_id: Some(stripe_event_id.to_string()),
                payload: payload.clone(),
            })
            .await
    }
}
