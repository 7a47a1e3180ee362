use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post},
};

use crate::{
    dto::applications::{
        ApplicationKind, ApplicationRequest, ApplicationSubmitted, DeletionRequested, MyRequests,
        Upload,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::application_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(my_requests))
        .route("/admin", post(apply_admin))
        .route("/support", post(apply_support))
        .route("/seller", post(apply_seller))
        .route("/deletion", post(request_deletion))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    responses(
        (status = 200, description = "Own applications and deletion request", body = ApiResponse<MyRequests>)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn my_requests(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MyRequests>>> {
    let resp = application_service::list_my_requests(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/applications/admin",
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "Application submitted", body = ApiResponse<ApplicationSubmitted>),
        (status = 403, description = "Already holds the role"),
        (status = 409, description = "Pending application exists"),
        (status = 422, description = "Missing required fields"),
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn apply_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplicationRequest>,
) -> AppResult<Json<ApiResponse<ApplicationSubmitted>>> {
    let resp =
        application_service::submit(&state, &user, ApplicationKind::Admin, payload, None).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/applications/support",
    responses(
        (status = 200, description = "Application submitted", body = ApiResponse<ApplicationSubmitted>),
        (status = 400, description = "Attachment rejected"),
        (status = 403, description = "Already holds the role"),
        (status = 409, description = "Pending application exists"),
        (status = 413, description = "Attachment too large"),
        (status = 422, description = "Missing required fields"),
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn apply_support(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ApplicationSubmitted>>> {
    let (payload, resume) = read_application_form(multipart).await?;
    let resp =
        application_service::submit(&state, &user, ApplicationKind::Support, payload, resume)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/applications/seller",
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "Application submitted", body = ApiResponse<ApplicationSubmitted>),
        (status = 403, description = "Already holds the role"),
        (status = 409, description = "Pending application exists"),
        (status = 422, description = "Missing required fields"),
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn apply_seller(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplicationRequest>,
) -> AppResult<Json<ApiResponse<ApplicationSubmitted>>> {
    let resp =
        application_service::submit(&state, &user, ApplicationKind::Seller, payload, None).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/applications/deletion",
    responses(
        (status = 200, description = "Deletion requested", body = ApiResponse<DeletionRequested>),
        (status = 409, description = "Pending deletion request exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn request_deletion(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DeletionRequested>>> {
    let resp = application_service::submit_deletion(&state, &user).await?;
    Ok(Json(resp))
}

/// Pull the application fields and the optional `resume` file out of a
/// multipart form.
async fn read_application_form(
    mut multipart: Multipart,
) -> AppResult<(ApplicationRequest, Option<Upload>)> {
    let mut payload = ApplicationRequest::default();
    let mut resume: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume" {
            let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?;
            if !bytes.is_empty() {
                resume = Some(Upload {
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
            "reason" => payload.reason = value,
            "experience" => payload.experience = value,
            "availability" => payload.availability = value,
            _ => {}
        }
    }

    Ok((payload, resume))
}
