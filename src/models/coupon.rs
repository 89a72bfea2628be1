use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

/// Persisted coupon row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_order_amount: Option<f64>,
    pub max_discount_amount: Option<f64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Operator input exactly as typed into the coupon dialog.
///
/// Blank optional fields mean "not set"; see [`crate::validation::validate_coupon_form`]
/// for how the strings become a [`CouponPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponForm {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: String,
    pub min_order_amount: String,
    pub max_discount_amount: String,
    /// RFC 3339 instant or a `datetime-local` value in the operator's zone.
    pub valid_until: String,
    pub is_active: bool,
}

impl Default for CouponForm {
    fn default() -> Self {
        Self {
            code: String::new(),
            discount_type: DiscountType::Percentage,
            discount_value: String::new(),
            min_order_amount: String::new(),
            max_discount_amount: String::new(),
            valid_until: String::new(),
            is_active: true,
        }
    }
}

impl CouponForm {
    /// Pre-fill the dialog for editing an existing coupon.
    pub fn from_coupon(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value.to_string(),
            min_order_amount: coupon
                .min_order_amount
                .map(|v| v.to_string())
                .unwrap_or_default(),
            max_discount_amount: coupon
                .max_discount_amount
                .map(|v| v.to_string())
                .unwrap_or_default(),
            valid_until: coupon
                .valid_until
                .map(to_local_input_value)
                .unwrap_or_default(),
            is_active: coupon.is_active,
        }
    }
}

/// Validated, normalized coupon ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponPayload {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_order_amount: Option<f64>,
    pub max_discount_amount: Option<f64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// One row of the admin coupon list, with display labels precomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponSummary {
    pub id: i64,
    pub code: String,
    pub discount_label: String,
    pub max_discount_label: Option<String>,
    pub min_order_label: Option<String>,
    pub valid_until_label: Option<String>,
    pub status_label: &'static str,
    pub is_active: bool,
}

impl CouponSummary {
    pub fn from_coupon(coupon: &Coupon, currency: &str) -> Self {
        let discount_label = match coupon.discount_type {
            DiscountType::Percentage => format!("{}% off", coupon.discount_value),
            DiscountType::Fixed => format!("{}{} off", currency, coupon.discount_value),
        };

        // A zero cap or minimum is not worth a line in the list.
        let max_discount_label = coupon
            .max_discount_amount
            .filter(|v| *v > 0.0)
            .map(|v| format!("Max discount: {}{}", currency, v));
        let min_order_label = coupon
            .min_order_amount
            .filter(|v| *v > 0.0)
            .map(|v| format!("Min order: {}{}", currency, v));

        Self {
            id: coupon.id,
            code: coupon.code.clone(),
            discount_label,
            max_discount_label,
            min_order_label,
            valid_until_label: coupon.valid_until.map(format_valid_until),
            status_label: if coupon.is_active { "Active" } else { "Inactive" },
            is_active: coupon.is_active,
        }
    }
}

/// `datetime-local` input value (`YYYY-MM-DDTHH:MM`) in the local zone.
pub fn to_local_input_value(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

/// List label, e.g. `05 Mar 2027, 09:30 PM`.
pub fn format_valid_until(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%d %b %Y, %I:%M %p")
        .to_string()
}
