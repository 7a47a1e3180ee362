use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, audit_best_effort},
    dto::applications::Upload,
    dto::profile::{ProfileResponse, UpdateProfileRequest},
    error::{AppError, AppResult, AttachmentError},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::{DEFAULT_AVATAR, sniff_image, upload_name},
    validate::require_fields,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ProfileResponse>> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let row = match row {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "OK",
        profile_response(row),
        Some(Meta::empty()),
    ))
}

/// Update name/email/phone/address, optionally the password, optionally the
/// avatar. The update is all-or-nothing: a wrong current password or a bad
/// avatar rejects every field, nothing is partially saved.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
    avatar: Option<Upload>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    require_fields(&[("name", &payload.name), ("email", &payload.email)])?;

    if payload.wants_password_change() {
        if payload.new_password.len() < 6 {
            return Err(AppError::BadRequest(
                "New password must be at least 6 characters".into(),
            ));
        }
        if payload.new_password != payload.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match".into()));
        }
    }

    let current: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let current = match current {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let email = payload.email.trim();
    let taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id != $2")
            .bind(email)
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Email is already in use".into()));
    }

    let password_hash = if payload.wants_password_change() {
        verify_password(&payload.current_password, &current.password_hash)?;
        Some(hash_password(&payload.new_password)?)
    } else {
        None
    };

    // Store the new avatar before touching the row; the old file is only
    // removed once both the new file and the update have landed.
    let new_picture = match avatar {
        Some(upload) => Some(store_avatar(state, user.user_id, &upload).await?),
        None => None,
    };
    let profile_picture = new_picture
        .clone()
        .or_else(|| current.profile_picture.clone());

    let update = sqlx::query_as(
        r#"
        UPDATE users
        SET name = $2, email = $3, phone = $4, address = $5,
            profile_picture = $6,
            password_hash = COALESCE($7, password_hash)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.name.trim())
    .bind(email)
    .bind(payload.phone.trim())
    .bind(payload.address.trim())
    .bind(profile_picture)
    .bind(password_hash.clone())
    .fetch_one(&state.pool)
    .await;

    let updated: User = match update {
        Ok(row) => row,
        Err(err) => {
            // The avatar already landed on disk; do not leave it orphaned.
            if let Some(name) = new_picture.as_deref() {
                if let Err(del) = state.store.delete(name).await {
                    tracing::warn!(error = %del, "failed to remove avatar after update failure");
                }
            }
            return Err(err.into());
        }
    };

    if new_picture.is_some() {
        if let Some(old) = current.profile_picture.as_deref() {
            if !old.is_empty() && old != DEFAULT_AVATAR {
                if let Err(err) = state.store.delete(old).await {
                    tracing::warn!(error = %err, "failed to delete old avatar");
                }
            }
        }
    }

    audit_best_effort(
        &state.pool,
        user.user_id,
        AuditAction::ProfileUpdated,
        Some(serde_json::json!({
            "password_changed": password_hash.is_some(),
            "avatar_replaced": new_picture.is_some(),
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated successfully",
        profile_response(updated),
        Some(Meta::empty()),
    ))
}

async fn store_avatar(state: &AppState, user_id: Uuid, upload: &Upload) -> AppResult<String> {
    let extension = sniff_image(&upload.bytes)
        .ok_or(AppError::AttachmentRejected(AttachmentError::WrongType))?;

    let name = upload_name("profile", user_id, extension);
    tracing::debug!(submitted = %upload.file_name, stored = %name, "storing avatar");
    match state.store.store(&name, &upload.bytes).await {
        Ok(stored) => Ok(stored),
        Err(err) => {
            tracing::error!(error = %err, "avatar storage failed");
            Err(AppError::AttachmentRejected(AttachmentError::StorageFailed))
        }
    }
}

fn verify_password(candidate: &str, stored_hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|_| AppError::BadRequest("Current password is incorrect".into()))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn profile_response(user: User) -> ProfileResponse {
    let roles = user.roles();
    ProfileResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        address: user.address,
        roles,
        profile_picture: user.profile_picture,
        created_at: user.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip_verifies() {
        let hash = hash_password("hunter2secret").unwrap();
        assert!(verify_password("hunter2secret", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AppError::BadRequest(_))
        ));
    }
}
