//! Fire-and-forget notification sink. A failed insert must never fail the
//! operation that triggered it; callers go through [`notify_best_effort`].

use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

pub async fn send_notification(
    pool: &DbPool,
    user_id: Uuid,
    message: &str,
    kind: &str,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, message, type)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(message)
    .bind(kind)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn notify_best_effort(pool: &DbPool, user_id: Uuid, message: &str) {
    if let Err(err) = send_notification(pool, user_id, message, "info").await {
        tracing::warn!(error = %err, %user_id, "notification failed");
    }
}
