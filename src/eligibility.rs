//! Redemption eligibility and discount computation.
//!
//! Pure functions over a [`Coupon`] and an order subtotal. The expiry is
//! checked against the instant passed in on every call, whatever was checked
//! when the coupon was saved.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::EligibilityError;
use crate::models::coupon::{Coupon, DiscountType};
use crate::validation::round_money;

/// Outcome of applying an eligible coupon to an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountQuote {
    pub coupon_id: i64,
    pub code: String,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

/// Decide whether `coupon` applies to `subtotal` at `now` and price it.
///
/// Checks run in order: active flag, expiry, minimum order.
///
/// Checkout validates the subtotal first (see
/// [`validate_subtotal`](crate::validation::validate_subtotal)). A negative or
/// non-finite subtotal that reaches this point is priced as an empty cart.
pub fn evaluate(
    coupon: &Coupon,
    subtotal: f64,
    now: DateTime<Utc>,
) -> Result<DiscountQuote, EligibilityError> {
    let subtotal = sanitize_subtotal(subtotal);

    if !coupon.is_active {
        return Err(EligibilityError::Inactive);
    }

    if let Some(valid_until) = coupon.valid_until {
        if now > valid_until {
            return Err(EligibilityError::Expired { valid_until });
        }
    }

    if let Some(min_order_amount) = coupon.min_order_amount {
        if subtotal < min_order_amount {
            return Err(EligibilityError::BelowMinimum {
                min_order_amount,
                subtotal,
            });
        }
    }

    let discount = discount_amount(coupon, subtotal);
    Ok(DiscountQuote {
        coupon_id: coupon.id,
        code: coupon.code.clone(),
        subtotal,
        discount,
        total: round_money(subtotal - discount),
    })
}

fn sanitize_subtotal(subtotal: f64) -> f64 {
    if subtotal.is_finite() {
        subtotal.max(0.0)
    } else {
        0.0
    }
}

/// Discount for `subtotal`, ignoring eligibility. Never negative and never
/// above the subtotal. The `max_discount_amount` cap applies to both types.
pub fn discount_amount(coupon: &Coupon, subtotal: f64) -> f64 {
    let subtotal = sanitize_subtotal(subtotal);

    let raw = match coupon.discount_type {
        DiscountType::Percentage => subtotal * coupon.discount_value / 100.0,
        DiscountType::Fixed => coupon.discount_value.min(subtotal),
    };

    let capped = match coupon.max_discount_amount {
        Some(cap) => raw.min(cap),
        None => raw,
    };

    round_money(capped).clamp(0.0, subtotal)
}
