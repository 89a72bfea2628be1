use sqlx::SqlitePool;

use crate::models::coupon::{Coupon, CouponPayload};

const SELECT_COUPON: &str = "SELECT id, code, discount_type, discount_value, min_order_amount,
        max_discount_amount, valid_until, is_active, created_at, updated_at
    FROM coupons";

/// Every coupon, newest first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!("{} ORDER BY created_at DESC, id DESC", SELECT_COUPON))
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!("{} WHERE id = ?", SELECT_COUPON))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Exact match on an already-normalized code.
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as::<_, Coupon>(&format!("{} WHERE code = ?", SELECT_COUPON))
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &SqlitePool, payload: &CouponPayload) -> Result<Coupon, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO coupons (
            code, discount_type, discount_value, min_order_amount,
            max_discount_amount, valid_until, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.code)
    .bind(payload.discount_type)
    .bind(payload.discount_value)
    .bind(payload.min_order_amount)
    .bind(payload.max_discount_amount)
    .bind(payload.valid_until)
    .bind(payload.is_active)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    sqlx::query_as::<_, Coupon>(&format!("{} WHERE id = ?", SELECT_COUPON))
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Overwrite every editable field. `None` when no row has this id.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    payload: &CouponPayload,
) -> Result<Option<Coupon>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE coupons SET
            code = ?, discount_type = ?, discount_value = ?, min_order_amount = ?,
            max_discount_amount = ?, valid_until = ?, is_active = ?,
            updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(&payload.code)
    .bind(payload.discount_type)
    .bind(payload.discount_value)
    .bind(payload.min_order_amount)
    .bind(payload.max_discount_amount)
    .bind(payload.valid_until)
    .bind(payload.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Permanent removal. Returns whether a row was deleted.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
