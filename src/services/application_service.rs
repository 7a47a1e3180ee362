use uuid::Uuid;

use crate::{
    audit::{AuditAction, audit_best_effort},
    dto::applications::{
        ApplicationKind, ApplicationRequest, ApplicationSubmitted, DeletionRequested, MyRequests,
        Upload,
    },
    error::{AppError, AppResult, AttachmentError},
    middleware::auth::AuthUser,
    models::{AccountDeletionRequest, RoleApplication},
    notify::notify_best_effort,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::{MAX_RESUME_BYTES, is_pdf, upload_name},
    validate::require_fields,
};

/// Submit a role-elevation request. One shape for the three variants; they
/// differ in required fields and, for support, an optional PDF resume.
pub async fn submit(
    state: &AppState,
    user: &AuthUser,
    kind: ApplicationKind,
    payload: ApplicationRequest,
    resume: Option<Upload>,
) -> AppResult<ApiResponse<ApplicationSubmitted>> {
    if user.roles.contains(kind.target_role()) {
        return Err(AppError::AuthorizationDenied(format!(
            "You already hold the {} role",
            kind.as_str()
        )));
    }

    let pending: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM role_applications \
         WHERE user_id = $1 AND kind = $2 AND status = 'pending'",
    )
    .bind(user.user_id)
    .bind(kind.as_str())
    .fetch_optional(&state.pool)
    .await?;
    if pending.is_some() {
        return Err(AppError::DuplicatePendingRequest(
            format!("{} application", kind.as_str()),
        ));
    }

    validate_required(kind, &payload)?;

    // Resume attachments only make sense for support applications.
    let resume_path = match (kind, resume) {
        (ApplicationKind::Support, Some(upload)) => {
            Some(store_resume(state, user.user_id, &upload).await?)
        }
        (_, Some(_)) => {
            return Err(AppError::BadRequest(
                "Only support applications accept a resume".into(),
            ));
        }
        (_, None) => None,
    };

    let application: RoleApplication = sqlx::query_as(
        r#"
        INSERT INTO role_applications
            (id, user_id, kind, name, email, phone, reason, experience,
             availability, resume_path, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(kind.as_str())
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(non_empty(&payload.phone))
    .bind(payload.reason.trim())
    .bind(non_empty(&payload.experience))
    .bind(non_empty(&payload.availability))
    .bind(resume_path)
    .fetch_one(&state.pool)
    .await?;

    notify_best_effort(
        &state.pool,
        user.user_id,
        &format!("Your {} role application has been submitted.", kind.as_str()),
    )
    .await;
    audit_best_effort(
        &state.pool,
        user.user_id,
        AuditAction::ApplicationSubmitted,
        Some(serde_json::json!({
            "application_id": application.id,
            "kind": kind.as_str(),
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Application submitted",
        ApplicationSubmitted {
            application_id: application.id,
        },
        Some(Meta::empty()),
    ))
}

/// Request account deletion; one pending request per user at a time.
pub async fn submit_deletion(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DeletionRequested>> {
    let pending: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM account_deletion_requests \
         WHERE user_id = $1 AND status = 'pending'",
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;
    if pending.is_some() {
        return Err(AppError::DuplicatePendingRequest(
            "account deletion".into(),
        ));
    }

    let request: AccountDeletionRequest = sqlx::query_as(
        r#"
        INSERT INTO account_deletion_requests (id, user_id, status)
        VALUES ($1, $2, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    notify_best_effort(
        &state.pool,
        user.user_id,
        "Your account deletion request has been sent to an admin.",
    )
    .await;
    audit_best_effort(
        &state.pool,
        user.user_id,
        AuditAction::DeletionRequested,
        Some(serde_json::json!({ "request_id": request.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deletion request submitted",
        DeletionRequested {
            request_id: request.id,
        },
        Some(Meta::empty()),
    ))
}

/// The caller's own applications plus any pending deletion request.
pub async fn list_my_requests(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MyRequests>> {
    let applications: Vec<RoleApplication> = sqlx::query_as(
        "SELECT * FROM role_applications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let deletion_request: Option<AccountDeletionRequest> = sqlx::query_as(
        "SELECT * FROM account_deletion_requests \
         WHERE user_id = $1 AND status = 'pending'",
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        MyRequests {
            applications,
            deletion_request,
        },
        Some(Meta::empty()),
    ))
}

fn validate_required(kind: ApplicationKind, payload: &ApplicationRequest) -> AppResult<()> {
    match kind {
        ApplicationKind::Admin => require_fields(&[
            ("name", &payload.name),
            ("email", &payload.email),
            ("reason", &payload.reason),
        ]),
        ApplicationKind::Support => require_fields(&[
            ("name", &payload.name),
            ("email", &payload.email),
            ("phone", &payload.phone),
            ("reason", &payload.reason),
            ("experience", &payload.experience),
            ("availability", &payload.availability),
        ]),
        ApplicationKind::Seller => require_fields(&[
            ("name", &payload.name),
            ("email", &payload.email),
            ("phone", &payload.phone),
            ("reason", &payload.reason),
        ]),
    }
}

/// Validate and persist a resume: sniffed PDF content, at most 5 MiB, stored
/// under a name derived from the applicant and the clock. A storage failure
/// rejects the whole submission.
async fn store_resume(state: &AppState, user_id: Uuid, upload: &Upload) -> AppResult<String> {
    if !is_pdf(&upload.bytes) {
        return Err(AppError::AttachmentRejected(AttachmentError::WrongType));
    }
    if upload.bytes.len() > MAX_RESUME_BYTES {
        return Err(AppError::AttachmentRejected(AttachmentError::TooLarge));
    }

    let name = upload_name("resume", user_id, "pdf");
    tracing::debug!(submitted = %upload.file_name, stored = %name, "storing resume");
    match state.store.store(&name, &upload.bytes).await {
        Ok(stored) => Ok(stored),
        Err(err) => {
            tracing::error!(error = %err, "resume storage failed");
            Err(AppError::AttachmentRejected(AttachmentError::StorageFailed))
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
