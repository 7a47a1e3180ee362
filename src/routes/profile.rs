use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::get,
};

use crate::{
    dto::applications::Upload,
    dto::profile::{ProfileResponse, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Current user profile", body = ApiResponse<ProfileResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let resp = profile_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid password change or avatar"),
        (status = 422, description = "Missing name or invalid email"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let (payload, avatar) = read_profile_form(multipart).await?;
    let resp = profile_service::update_profile(&state, &user, payload, avatar).await?;
    Ok(Json(resp))
}

async fn read_profile_form(
    mut multipart: Multipart,
) -> AppResult<(UpdateProfileRequest, Option<Upload>)> {
    let mut payload = UpdateProfileRequest::default();
    let mut avatar: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "profile_picture" {
            let file_name = field.file_name().unwrap_or("avatar").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?;
            if !bytes.is_empty() {
                avatar = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?;
        match name.as_str() {
            "name" => payload.name = value,
            "email" => payload.email = value,
            "phone" => payload.phone = value,
            "address" => payload.address = value,
            "current_password" => payload.current_password = value,
            "new_password" => payload.new_password = value,
            "confirm_password" => payload.confirm_password = value,
            _ => {}
        }
    }

    Ok((payload, avatar))
}
