use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections raised while checking operator input, before anything reaches
/// the store. The message is what the operator sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Coupon code is required")]
    CodeRequired,

    #[error("Enter a valid discount value greater than 0")]
    InvalidDiscountValue,

    #[error("Percentage discount cannot exceed 100")]
    PercentageExceedsHundred,

    #[error("Minimum order amount must be 0 or greater")]
    InvalidMinOrderAmount,

    #[error("Max discount amount must be 0 or greater")]
    InvalidMaxDiscountAmount,

    #[error("Valid until is not a recognised date and time: {0}")]
    InvalidValidUntil(String),

    #[error("Valid until must be a future date and time")]
    ValidUntilNotFuture,

    #[error("Coupon deletion must be confirmed")]
    DeleteNotConfirmed,

    #[error("Order subtotal must be 0 or greater")]
    InvalidSubtotal,
}

/// Why a coupon cannot be applied to an order. Returned to checkout as a
/// value so the caller can render a specific message.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EligibilityError {
    #[error("This coupon is not active")]
    Inactive,

    #[error("This coupon expired on {valid_until}")]
    Expired { valid_until: DateTime<Utc> },

    #[error("Order subtotal {subtotal:.2} is below the minimum of {min_order_amount:.2} for this coupon")]
    BelowMinimum { min_order_amount: f64, subtotal: f64 },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Store rejections (unique code, check constraints) are shown verbatim.
    #[error("{0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Error: {0}")]
    Internal(String),
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_reach_the_operator_unchanged() {
        let err: String = AppError::from(ValidationError::ValidUntilNotFuture).into();
        assert_eq!(err, "Valid until must be a future date and time");
    }

    #[test]
    fn eligibility_errors_serialize_with_kind_tag() {
        let json = serde_json::to_value(EligibilityError::BelowMinimum {
            min_order_amount: 500.0,
            subtotal: 400.0,
        })
        .unwrap();
        assert_eq!(json["kind"], "BelowMinimum");
        assert_eq!(json["min_order_amount"], 500.0);

        let json = serde_json::to_value(EligibilityError::Inactive).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "Inactive" }));
    }
}
