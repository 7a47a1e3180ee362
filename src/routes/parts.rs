use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Part,
    response::{ApiResponse, Meta},
    routes::params::{PartQuery, PartSortBy, SortOrder},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct PartList {
    pub items: Vec<Part>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parts))
        .route("/{id}", get(get_part))
}

#[utoipa::path(
    get,
    path = "/api/parts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name search"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, name"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "List active parts", body = ApiResponse<PartList>)
    ),
    tag = "Parts"
)]
pub async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<PartQuery>,
) -> AppResult<Json<ApiResponse<PartList>>> {
    let (page, limit, offset) = query.pagination.normalize();
    let sort_by = query.sort_by.unwrap_or(PartSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let search = query
        .q
        .filter(|q| !q.trim().is_empty())
        .map(|q| format!("%{}%", q.trim()));

    let sql = format!(
        "SELECT * FROM parts WHERE status = 'active' \
         AND ($1::text IS NULL OR name ILIKE $1) \
         ORDER BY {} {} LIMIT $2 OFFSET $3",
        sort_by.as_sql(),
        sort_order.as_sql()
    );
    let items: Vec<Part> = sqlx::query_as(&sql)
        .bind(search.clone())
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM parts WHERE status = 'active' \
         AND ($1::text IS NULL OR name ILIKE $1)",
    )
    .bind(search)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(Json(ApiResponse::success(
        "OK",
        PartList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/parts/{id}",
    params(
        ("id" = Uuid, Path, description = "Part ID")
    ),
    responses(
        (status = 200, description = "Part detail", body = ApiResponse<Part>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Parts"
)]
pub async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Part>>> {
    let part: Option<Part> =
        sqlx::query_as("SELECT * FROM parts WHERE id = $1 AND status = 'active'")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    match part {
        Some(part) => Ok(Json(ApiResponse::success("OK", part, Some(Meta::empty())))),
        None => Err(AppError::NotFound),
    }
}
