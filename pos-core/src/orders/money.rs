//! Money calculation using rust_decimal
//!
//! All amounts are `Decimal`; totals are rounded to 2 places (half away
//! from zero) when recomputed.

use crate::orders::traits::OrderError;
use rust_decimal::prelude::*;
use shared::order::{OrderSnapshot, PaymentInput, PaymentType};

/// Rounding for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 9999;

/// Maximum allowed amount for fees, discounts and tendered cash
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Validate a line quantity (1..=MAX_QUANTITY)
pub fn validate_quantity(quantity: i32) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::validation(
            "quantity",
            format!("quantity must be positive, got {quantity}"),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderError::validation(
            "quantity",
            format!("quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"),
        ));
    }
    Ok(())
}

/// Validate a fee/discount/tendered amount
pub fn validate_amount(field: &'static str, value: Decimal) -> Result<(), OrderError> {
    if value < Decimal::ZERO {
        return Err(OrderError::InvalidAmount { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(OrderError::validation(
            field,
            format!("{field} exceeds maximum allowed ({MAX_AMOUNT}), got {value}"),
        ));
    }
    Ok(())
}

/// Recompute line totals, subtotal and total
///
/// total = max(0, subtotal + delivery_fee - discount)
pub fn recalculate_totals(snapshot: &mut OrderSnapshot) {
    let mut subtotal = Decimal::ZERO;
    for item in &mut snapshot.items {
        item.line_total = line_total(item.unit_price, item.quantity);
        subtotal += item.line_total;
    }
    snapshot.subtotal = subtotal;
    let total = subtotal + snapshot.delivery_fee - snapshot.discount;
    snapshot.total = round_money(total.max(Decimal::ZERO));
}

/// Resolve the amounts of a settlement
///
/// Returns `(amount_received, change)`. Cash must cover the total; other
/// payment types are recorded as exactly the total.
pub fn settlement_amounts(
    total: Decimal,
    payment: &PaymentInput,
) -> Result<(Decimal, Decimal), OrderError> {
    match payment.payment_type {
        PaymentType::Cash => {
            let tendered = payment.amount_tendered.ok_or_else(|| {
                OrderError::validation("amount_tendered", "cash payments need an amount tendered")
            })?;
            validate_amount("amount_tendered", tendered)?;
            if tendered < total {
                return Err(OrderError::InsufficientPayment { total, tendered });
            }
            Ok((tendered, round_money(tendered - total)))
        }
        PaymentType::Card | PaymentType::InstantTransfer => Ok((total, Decimal::ZERO)),
    }
}
