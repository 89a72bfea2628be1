//! Input validation and normalization for coupon data.
//!
//! Everything the operator types goes through here before it can reach the
//! store:
//! - coupon codes (trimmed, uppercased)
//! - amounts and percentages (locale-invariant, rounded to cents)
//! - expiry instants (RFC 3339 or `datetime-local` form values)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::errors::ValidationError;
use crate::models::coupon::{CouponForm, CouponPayload, DiscountType};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Layouts accepted from a `datetime-local` input.
const LOCAL_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Past this magnitude an `f64` has no fractional cents left to round.
const WHOLE_CENTS_LIMIT: f64 = 45_035_996_273_704.96; // 2^52 / 100

/// Round to 2 decimal places, the precision every stored amount uses.
/// Values too large to carry cents are returned unchanged, so scaling by 100
/// cannot overflow to infinity.
pub fn round_money(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= WHOLE_CENTS_LIMIT {
        return value;
    }
    (value * 100.0).round() / 100.0
}

/// Canonical form of a coupon code as stored and as looked up.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parse a decimal typed by a person. `.` is the only decimal separator;
/// surrounding whitespace is ignored. Non-finite values are refused.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn validate_code(raw: &str) -> ValidationResult<String> {
    let code = normalize_code(raw);
    if code.is_empty() {
        return Err(ValidationError::CodeRequired);
    }
    Ok(code)
}

/// Discount value, rounded. The rounded value must stay above zero, so
/// `0.004` is refused rather than stored as a zero discount.
pub fn validate_discount_value(raw: &str, discount_type: DiscountType) -> ValidationResult<f64> {
    let value = parse_decimal(raw)
        .filter(|v| *v > 0.0)
        .ok_or(ValidationError::InvalidDiscountValue)?;

    if discount_type == DiscountType::Percentage && value > 100.0 {
        return Err(ValidationError::PercentageExceedsHundred);
    }

    let rounded = round_money(value);
    if !rounded.is_finite() || rounded <= 0.0 {
        return Err(ValidationError::InvalidDiscountValue);
    }
    Ok(rounded)
}

/// Optional non-negative amount. Blank input means "not set".
fn validate_optional_amount(raw: &str, error: ValidationError) -> ValidationResult<Option<f64>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_decimal(raw)
        .filter(|v| *v >= 0.0)
        .map(round_money)
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or(error)
}

pub fn validate_min_order_amount(raw: &str) -> ValidationResult<Option<f64>> {
    validate_optional_amount(raw, ValidationError::InvalidMinOrderAmount)
}

pub fn validate_max_discount_amount(raw: &str) -> ValidationResult<Option<f64>> {
    validate_optional_amount(raw, ValidationError::InvalidMaxDiscountAmount)
}

/// Parse an expiry instant. Values without an offset are read in the local
/// time zone, like the browser's `datetime-local` input.
pub fn parse_valid_until(raw: &str) -> ValidationResult<Option<DateTime<Utc>>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(instant.with_timezone(&Utc)));
    }

    let naive = LOCAL_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidValidUntil(trimmed.to_string()))?;

    // Times skipped by a DST jump have no local instant.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| Some(local.with_timezone(&Utc)))
        .ok_or_else(|| ValidationError::InvalidValidUntil(trimmed.to_string()))
}

pub fn validate_valid_until(raw: &str, now: DateTime<Utc>) -> ValidationResult<Option<DateTime<Utc>>> {
    match parse_valid_until(raw)? {
        Some(instant) if instant <= now => Err(ValidationError::ValidUntilNotFuture),
        other => Ok(other),
    }
}

/// Subtotal supplied by checkout.
pub fn validate_subtotal(subtotal: f64) -> ValidationResult<f64> {
    if !subtotal.is_finite() || subtotal < 0.0 {
        return Err(ValidationError::InvalidSubtotal);
    }
    Ok(subtotal)
}

/// Turn the coupon dialog into a payload. Checks run in a fixed order and the
/// first failure is returned.
pub fn validate_coupon_form(form: &CouponForm, now: DateTime<Utc>) -> ValidationResult<CouponPayload> {
    let code = validate_code(&form.code)?;
    let discount_value = validate_discount_value(&form.discount_value, form.discount_type)?;
    let min_order_amount = validate_min_order_amount(&form.min_order_amount)?;
    let max_discount_amount = validate_max_discount_amount(&form.max_discount_amount)?;
    let valid_until = validate_valid_until(&form.valid_until, now)?;

    Ok(CouponPayload {
        code,
        discount_type: form.discount_type,
        discount_value,
        min_order_amount,
        max_discount_amount,
        valid_until,
        is_active: form.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn form(discount_type: DiscountType, value: &str) -> CouponForm {
        CouponForm {
            code: "  fresh10 ".into(),
            discount_type,
            discount_value: value.into(),
            ..CouponForm::default()
        }
    }

    #[test]
    fn code_is_trimmed_and_uppercased() {
        let payload = validate_coupon_form(&form(DiscountType::Percentage, "10"), Utc::now()).unwrap();
        assert_eq!(payload.code, "FRESH10");
    }

    #[test]
    fn blank_code_is_rejected_first() {
        let mut input = form(DiscountType::Percentage, "-1");
        input.code = "   ".into();
        assert_eq!(
            validate_coupon_form(&input, Utc::now()),
            Err(ValidationError::CodeRequired)
        );
    }

    #[test]
    fn percentage_outside_zero_to_hundred_is_rejected() {
        let now = Utc::now();
        for value in ["0", "-5", "", "abc", "NaN", "inf"] {
            assert_eq!(
                validate_coupon_form(&form(DiscountType::Percentage, value), now),
                Err(ValidationError::InvalidDiscountValue),
                "value {value:?}"
            );
        }
        for value in ["100.01", "250"] {
            assert_eq!(
                validate_coupon_form(&form(DiscountType::Percentage, value), now),
                Err(ValidationError::PercentageExceedsHundred),
                "value {value:?}"
            );
        }
        assert!(validate_coupon_form(&form(DiscountType::Percentage, "100"), now).is_ok());
    }

    #[test]
    fn fixed_discount_has_no_upper_bound() {
        let now = Utc::now();
        assert_eq!(
            validate_coupon_form(&form(DiscountType::Fixed, "0"), now),
            Err(ValidationError::InvalidDiscountValue)
        );
        let payload = validate_coupon_form(&form(DiscountType::Fixed, "5000"), now).unwrap();
        assert_eq!(payload.discount_value, 5000.0);
    }

    #[test]
    fn value_that_rounds_to_zero_is_rejected() {
        assert_eq!(
            validate_discount_value("0.004", DiscountType::Fixed),
            Err(ValidationError::InvalidDiscountValue)
        );
    }

    #[test]
    fn amounts_are_rounded_to_cents() {
        let mut input = form(DiscountType::Percentage, " 12.346 ");
        input.min_order_amount = "499.999".into();
        input.max_discount_amount = "75.5".into();
        let payload = validate_coupon_form(&input, Utc::now()).unwrap();
        assert_eq!(payload.discount_value, 12.35);
        assert_eq!(payload.min_order_amount, Some(500.0));
        assert_eq!(payload.max_discount_amount, Some(75.5));
    }

    #[test]
    fn huge_amounts_stay_finite() {
        assert_eq!(validate_discount_value("1e307", DiscountType::Fixed), Ok(1e307));
        assert_eq!(validate_min_order_amount("1e307"), Ok(Some(1e307)));
        assert_eq!(validate_max_discount_amount("1.7e308"), Ok(Some(1.7e308)));
        assert_eq!(round_money(45_035_996_273_704.96), 45_035_996_273_704.96);
        assert_eq!(round_money(-2.345_6), -2.35);
    }

    #[test]
    fn blank_optional_amounts_are_absent() {
        let mut input = form(DiscountType::Fixed, "50");
        input.min_order_amount = "  ".into();
        let payload = validate_coupon_form(&input, Utc::now()).unwrap();
        assert_eq!(payload.min_order_amount, None);
        assert_eq!(payload.max_discount_amount, None);
        assert_eq!(payload.valid_until, None);
    }

    #[test]
    fn negative_limits_are_rejected_in_order() {
        let mut input = form(DiscountType::Fixed, "50");
        input.min_order_amount = "-1".into();
        input.max_discount_amount = "-1".into();
        assert_eq!(
            validate_coupon_form(&input, Utc::now()),
            Err(ValidationError::InvalidMinOrderAmount)
        );

        input.min_order_amount = "0".into();
        assert_eq!(
            validate_coupon_form(&input, Utc::now()),
            Err(ValidationError::InvalidMaxDiscountAmount)
        );
    }

    #[test]
    fn comma_decimal_separator_is_not_accepted() {
        assert_eq!(parse_decimal("12,5"), None);
        assert_eq!(parse_decimal("12.5"), Some(12.5));
    }

    #[test]
    fn valid_until_must_be_strictly_in_the_future() {
        let now = Utc::now();
        let mut input = form(DiscountType::Percentage, "10");

        input.valid_until = (now - Duration::days(1)).to_rfc3339();
        assert_eq!(
            validate_coupon_form(&input, now),
            Err(ValidationError::ValidUntilNotFuture)
        );

        input.valid_until = now.to_rfc3339();
        assert_eq!(
            validate_coupon_form(&input, now),
            Err(ValidationError::ValidUntilNotFuture)
        );

        let tomorrow = now + Duration::days(1);
        input.valid_until = tomorrow.to_rfc3339();
        let payload = validate_coupon_form(&input, now).unwrap();
        assert_eq!(payload.valid_until, Some(tomorrow));
    }

    #[test]
    fn local_input_values_are_read_in_local_time() {
        let parsed = parse_valid_until("2031-06-01T09:30").unwrap().unwrap();
        let expected = Local
            .with_ymd_and_hms(2031, 6, 1, 9, 30, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn unparseable_valid_until_is_reported() {
        assert_eq!(
            parse_valid_until("next tuesday"),
            Err(ValidationError::InvalidValidUntil("next tuesday".into()))
        );
    }

    #[test]
    fn subtotal_must_be_finite_and_non_negative() {
        assert_eq!(validate_subtotal(0.0), Ok(0.0));
        assert_eq!(validate_subtotal(-0.01), Err(ValidationError::InvalidSubtotal));
        assert_eq!(validate_subtotal(f64::NAN), Err(ValidationError::InvalidSubtotal));
    }
}
