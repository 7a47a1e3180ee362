use uuid::Uuid;

use crate::{
    audit::{AuditAction, audit_best_effort},
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::{Order, OrderItem},
    notify::notify_best_effort,
    pricing,
    response::{ApiResponse, Meta},
    roles::Role,
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    validate::require_fields,
};

#[derive(Debug, sqlx::FromRow)]
struct CartLine {
    part_id: Uuid,
    quantity: i32,
    name: String,
    price: i64,
}

/// Place an order from the buyer's current cart: one transaction that
/// creates the order with its shipping snapshot, captures per-line prices,
/// decrements stock and clears the cart. Any failure rolls the whole thing
/// back; stock is decremented with a conditional update so two concurrent
/// checkouts can never drive it negative.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_role(user, Role::Buyer)?;
    validate_shipping(&payload)?;

    let lines: Vec<CartLine> = sqlx::query_as(
        r#"
        SELECT ci.part_id, ci.quantity, p.name, p.price
        FROM cart_items ci
        JOIN parts p ON p.id = ci.part_id
        WHERE ci.buyer_id = $1 AND p.status = 'active'
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    // Empty cart aborts before a transaction is even opened.
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let subtotal: i64 = lines
        .iter()
        .map(|line| line.price * i64::from(line.quantity))
        .sum();
    let total_amount = pricing::order_total(subtotal);

    let mut txn = state.pool.begin().await?;

    let order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (id, buyer_id, total_amount, status,
                            shipping_name, shipping_email, shipping_phone,
                            shipping_address, shipping_city, shipping_state,
                            shipping_zip_code, shipping_country)
        VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(total_amount)
    .bind(payload.full_name.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.trim())
    .bind(payload.address.trim())
    .bind(payload.city.trim())
    .bind(payload.state.trim())
    .bind(payload.zip_code.trim())
    .bind(payload.country.trim())
    .fetch_one(&mut *txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());

    for line in &lines {
        // Conditional decrement closes the check-then-write race: zero rows
        // affected means someone else got the stock first.
        let updated = sqlx::query(
            "UPDATE parts SET stock_quantity = stock_quantity - $1 \
             WHERE id = $2 AND stock_quantity >= $1",
        )
        .bind(line.quantity)
        .bind(line.part_id)
        .execute(&mut *txn)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the open transaction rolls everything back.
            return Err(AppError::InsufficientStock(line.name.clone()));
        }

        let item: OrderItem = sqlx::query_as(
            r#"
            INSERT INTO order_items (id, order_id, part_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(line.part_id)
        .bind(line.quantity)
        .bind(line.price)
        .fetch_one(&mut *txn)
        .await?;

        items.push(item);
    }

    sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
        .bind(user.user_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    notify_best_effort(
        &state.pool,
        user.user_id,
        "Your order has been placed successfully.",
    )
    .await;

    audit_best_effort(
        &state.pool,
        user.user_id,
        AuditAction::OrderPlaced,
        Some(serde_json::json!({ "order_id": order.id, "total": total_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let sort = query.sort_order.unwrap_or(SortOrder::Desc);
    let status = query.status.clone().filter(|s| !s.is_empty());

    let sql = format!(
        "SELECT * FROM orders WHERE buyer_id = $1 \
         AND ($2::text IS NULL OR status = $2) \
         ORDER BY created_at {} LIMIT $3 OFFSET $4",
        sort.as_sql()
    );
    let orders: Vec<Order> = sqlx::query_as(&sql)
        .bind(user.user_id)
        .bind(status.clone())
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE buyer_id = $1 \
         AND ($2::text IS NULL OR status = $2)",
    )
    .bind(user.user_id)
    .bind(status)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 AND id = $2")
            .bind(user.user_id)
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items: Vec<OrderItem> =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at")
            .bind(order.id)
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

fn validate_shipping(payload: &CheckoutRequest) -> AppResult<()> {
    require_fields(&[
        ("full_name", &payload.full_name),
        ("email", &payload.email),
        ("phone", &payload.phone),
        ("address", &payload.address),
        ("city", &payload.city),
        ("state", &payload.state),
        ("zip_code", &payload.zip_code),
        ("country", &payload.country),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> CheckoutRequest {
        CheckoutRequest {
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            zip_code: "560001".into(),
            country: "India".into(),
        }
    }

    #[test]
    fn complete_shipping_payload_passes() {
        assert!(validate_shipping(&shipping()).is_ok());
    }

    #[test]
    fn blank_fields_are_all_reported() {
        let mut payload = shipping();
        payload.city = "  ".into();
        payload.country = String::new();
        let err = validate_shipping(&payload).unwrap_err();
        match err {
            AppError::ValidationFailed(fields) => {
                assert_eq!(fields, vec!["city".to_string(), "country".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut payload = shipping();
        payload.email = "asha_at_example".into();
        assert!(matches!(
            validate_shipping(&payload),
            Err(AppError::ValidationFailed(_))
        ));
    }
}
