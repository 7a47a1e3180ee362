use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::CartItem,
    response::{ApiResponse, Meta},
    roles::Role,
    routes::params::Pagination,
    state::AppState,
};

pub async fn cart_list(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    ensure_role(user, Role::Buyer)?;
    let (page, limit, offset) = pagination.normalize();
    let items: Vec<CartItem> = sqlx::query_as(
        "SELECT * FROM cart_items WHERE buyer_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE buyer_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Add a part to the cart or replace the quantity of an existing line.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_role(user, Role::Buyer)?;
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    let part: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM parts WHERE id = $1 AND status = 'active'")
            .bind(payload.part_id)
            .fetch_optional(&state.pool)
            .await?;
    if part.is_none() {
        return Err(AppError::BadRequest("part not found".to_string()));
    }

    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, buyer_id, part_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (buyer_id, part_id) DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.part_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    part_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_role(user, Role::Buyer)?;
    let result = sqlx::query("DELETE FROM cart_items WHERE part_id = $1 AND buyer_id = $2")
        .bind(part_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
