use chrono::NaiveDateTime;
use uuid::Uuid;

/// Minimal user directory row. Auth lives elsewhere; the reconciler only needs
/// the id/email pair for the customer-email fallback lookup.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: Option<NaiveDateTime>,
}
