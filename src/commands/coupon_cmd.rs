use chrono::Utc;
use serde::Serialize;

use crate::audit::{log_coupon_action, CouponAuditAction};
use crate::auth::guard::validate_admin;
use crate::cache::QueryKey;
use crate::database::coupons;
use crate::errors::{AppError, AppResult, ValidationError};
use crate::models::coupon::{Coupon, CouponForm, CouponSummary};
use crate::validation::validate_coupon_form;
use crate::AppState;

/// Result of a successful save, with the notice the admin screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct SavedCoupon {
    pub coupon: Coupon,
    pub notice: &'static str,
}

/// Store errors are shown as-is; an empty message gets a generic fallback.
fn surface(err: AppError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Coupons for the admin list, newest first. Served from the cache until a
/// mutation invalidates it.
pub async fn list_coupons(state: &AppState, session_token: &str) -> Result<Vec<CouponSummary>, String> {
    validate_admin(state, session_token)?;

    let cache = &state.coupon_cache;
    let listing = match cache.get(&QueryKey::AdminCoupons) {
        Some(cached) => {
            crate::log_debug!("COUPON", "Coupon list served from cache", serde_json::json!({
                "count": cached.len(),
                "fetched_at": cache.fetched_at(&QueryKey::AdminCoupons),
            }));
            cached
        }
        None => {
            let generation = cache.generation();
            let fresh = coupons::list_all(&state.db).await.map_err(AppError::from)?;
            let cached = cache.insert(QueryKey::AdminCoupons, fresh.clone(), generation);
            crate::log_debug!("COUPON", "Coupon list fetched", serde_json::json!({
                "count": fresh.len(),
                "cached": cached,
            }));
            fresh
        }
    };

    let currency = &state.config.storefront.currency_symbol;
    Ok(listing
        .iter()
        .map(|c| CouponSummary::from_coupon(c, currency))
        .collect())
}

/// Pre-filled dialog for editing coupon `id`.
pub async fn get_coupon_form(state: &AppState, session_token: &str, id: i64) -> Result<CouponForm, String> {
    validate_admin(state, session_token)?;

    let coupon = coupons::find_by_id(&state.db, id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("coupon {}", id)))?;

    Ok(CouponForm::from_coupon(&coupon))
}

/// Create (`id` is `None`) or update a coupon from the dialog.
pub async fn save_coupon(
    state: &AppState,
    session_token: &str,
    id: Option<i64>,
    form: CouponForm,
) -> Result<SavedCoupon, String> {
    save(state, session_token, id, &form)
        .await
        .map_err(|e| surface(e, "Failed to save coupon"))
}

async fn save(
    state: &AppState,
    session_token: &str,
    id: Option<i64>,
    form: &CouponForm,
) -> AppResult<SavedCoupon> {
    let session = validate_admin(state, session_token)?;
    let payload = validate_coupon_form(form, Utc::now())?;

    let (coupon, action, notice) = match id {
        None => (
            coupons::insert(&state.db, &payload).await?,
            CouponAuditAction::Create,
            "Coupon created",
        ),
        Some(id) => (
            coupons::update(&state.db, id, &payload)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("coupon {}", id)))?,
            CouponAuditAction::Update,
            "Coupon updated",
        ),
    };

    state.coupon_cache.invalidate(&QueryKey::AdminCoupons);

    let metadata = serde_json::json!({
        "id": coupon.id,
        "code": coupon.code,
        "discount_type": coupon.discount_type.as_str(),
        "discount_value": coupon.discount_value,
        "is_active": coupon.is_active,
    });
    crate::log_coupon!(notice, metadata);
    if state.config.security.enable_audit_log {
        log_coupon_action(
            &state.db,
            &session.user_id,
            action,
            &format!("{} {}", notice, coupon.code),
            Some(&metadata),
        )
        .await;
    }

    Ok(SavedCoupon { coupon, notice })
}

/// Permanently remove a coupon. `confirmed` is the operator's answer to the
/// confirmation prompt; nothing is touched without it.
pub async fn delete_coupon(
    state: &AppState,
    session_token: &str,
    id: i64,
    confirmed: bool,
) -> Result<&'static str, String> {
    delete(state, session_token, id, confirmed)
        .await
        .map_err(|e| surface(e, "Failed to delete coupon"))
}

async fn delete(state: &AppState, session_token: &str, id: i64, confirmed: bool) -> AppResult<&'static str> {
    let session = validate_admin(state, session_token)?;
    if !confirmed {
        return Err(ValidationError::DeleteNotConfirmed.into());
    }

    let removed = coupons::delete(&state.db, id).await?;
    state.coupon_cache.invalidate(&QueryKey::AdminCoupons);

    if !removed {
        crate::log_warn!("COUPON", "Delete of unknown coupon", serde_json::json!({ "id": id }));
        return Ok("Coupon deleted");
    }

    let metadata = serde_json::json!({ "id": id });
    crate::log_coupon!("Coupon deleted", metadata);
    if state.config.security.enable_audit_log {
        log_coupon_action(
            &state.db,
            &session.user_id,
            CouponAuditAction::Delete,
            &format!("Deleted coupon {}", id),
            Some(&metadata),
        )
        .await;
    }

    Ok("Coupon deleted")
}
