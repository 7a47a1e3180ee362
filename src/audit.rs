use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Everything the marketplace writes an audit trail for. A closed enum so
/// the `audit_logs.action` column never accumulates typo'd free strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegistered,
    UserLoggedIn,
    OrderPlaced,
    ApplicationSubmitted,
    DeletionRequested,
    ProfileUpdated,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserRegistered => "user_register",
            AuditAction::UserLoggedIn => "user_login",
            AuditAction::OrderPlaced => "checkout",
            AuditAction::ApplicationSubmitted => "application_submit",
            AuditAction::DeletionRequested => "account_deletion_request",
            AuditAction::ProfileUpdated => "profile_update",
        }
    }

    /// The table the action touches, recorded next to it.
    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegistered
            | AuditAction::UserLoggedIn
            | AuditAction::ProfileUpdated => "users",
            AuditAction::OrderPlaced => "orders",
            AuditAction::ApplicationSubmitted => "role_applications",
            AuditAction::DeletionRequested => "account_deletion_requests",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit writes never fail the request they describe.
pub async fn audit_best_effort(
    pool: &DbPool,
    user_id: Uuid,
    action: AuditAction,
    metadata: Option<Value>,
) {
    if let Err(err) = log_audit(pool, Some(user_id), action, metadata).await {
        tracing::warn!(action = action.as_str(), error = %err, "audit log failed");
    }
}
