use chrono::Utc;
use serde::Serialize;

use crate::auth::guard::validate_session;
use crate::database::coupons;
use crate::eligibility::{evaluate, DiscountQuote};
use crate::errors::{AppResult, EligibilityError};
use crate::models::coupon::format_valid_until;
use crate::rate_limiter::CHECKOUT_COUPON_LIMIT;
use crate::validation::{validate_code, validate_subtotal};
use crate::AppState;

/// Answer to "does this code work for my cart?".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponCheck {
    Applied {
        quote: DiscountQuote,
    },
    Rejected {
        code: String,
        reason: EligibilityError,
        message: String,
    },
    NotFound {
        code: String,
        message: String,
    },
}

/// Message for the cart page.
pub fn customer_message(reason: &EligibilityError, currency: &str) -> String {
    match reason {
        EligibilityError::Inactive => "This coupon is no longer available".to_string(),
        EligibilityError::Expired { valid_until } => {
            format!("This coupon expired on {}", format_valid_until(*valid_until))
        }
        EligibilityError::BelowMinimum {
            min_order_amount,
            subtotal,
        } => format!(
            "Add {}{:.2} more to use this coupon (minimum order {}{})",
            currency,
            min_order_amount - subtotal,
            currency,
            min_order_amount
        ),
    }
}

/// Look up `code` and price it against the cart subtotal.
pub async fn check_coupon(
    state: &AppState,
    session_token: &str,
    code: &str,
    subtotal: f64,
) -> Result<CouponCheck, String> {
    check(state, session_token, code, subtotal)
        .await
        .map_err(String::from)
}

async fn check(state: &AppState, session_token: &str, code: &str, subtotal: f64) -> AppResult<CouponCheck> {
    let session = validate_session(state, session_token)?;
    CHECKOUT_COUPON_LIMIT.check(&session.user_id)?;

    let subtotal = validate_subtotal(subtotal)?;
    let code = validate_code(code)?;

    let Some(coupon) = coupons::find_by_code(&state.db, &code).await? else {
        crate::log_debug!("CHECKOUT", "Unknown coupon code", serde_json::json!({ "code": code }));
        return Ok(CouponCheck::NotFound {
            message: format!("Coupon {} was not found", code),
            code,
        });
    };

    let currency = &state.config.storefront.currency_symbol;
    match evaluate(&coupon, subtotal, Utc::now()) {
        Ok(quote) => Ok(CouponCheck::Applied { quote }),
        Err(reason) => {
            crate::log_debug!("CHECKOUT", "Coupon rejected", serde_json::json!({
                "code": code,
                "reason": reason,
            }));
            Ok(CouponCheck::Rejected {
                message: customer_message(&reason, currency),
                code,
                reason,
            })
        }
    }
}
