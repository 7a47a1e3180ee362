//! Checkout pricing policy. Amounts are whole currency units.

/// Flat shipping fee charged on any non-empty order.
pub const SHIPPING_FEE: i64 = 99;

/// Tax rate in percent.
pub const TAX_RATE_PERCENT: i64 = 8;

pub fn shipping_cost(subtotal: i64) -> i64 {
    if subtotal > 0 { SHIPPING_FEE } else { 0 }
}

/// Tax rounded half-up to a whole unit. The rounded value is what gets
/// persisted on the order, so the stored total always reconciles with the
/// displayed one.
pub fn tax_amount(subtotal: i64) -> i64 {
    (subtotal * TAX_RATE_PERCENT + 50) / 100
}

pub fn order_total(subtotal: i64) -> i64 {
    subtotal + shipping_cost(subtotal) + tax_amount(subtotal)
}
