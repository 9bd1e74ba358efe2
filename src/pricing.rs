//! Line pricing.
//!
//! Amounts are [`Decimal`], so multiplication and summation are exact at the
//! currency's native precision. The calculator is pure: callers guarantee
//! `quantity >= 1` and non-negative prices before invoking it, and the
//! discount price never exceeds the reference price for a persisted product.

use rust_decimal::Decimal;

/// Computes `(item_total, item_mrp)` for one bag line.
///
/// When a discount price is present it is the amount actually charged per
/// unit and `unit_price` is the reference MRP per unit. Without a discount
/// both amounts are the same.
pub fn line_amounts(
    unit_price: Decimal,
    unit_discount_price: Option<Decimal>,
    quantity: i32,
) -> (Decimal, Decimal) {
    let quantity = Decimal::from(quantity);
    let item_mrp = unit_price * quantity;
    let item_total = match unit_discount_price {
        Some(discounted) => discounted * quantity,
        None => item_mrp,
    };
    (item_total, item_mrp)
}
