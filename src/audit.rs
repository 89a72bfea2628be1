use sqlx::SqlitePool;

/// Coupon mutations recorded in `activity_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponAuditAction {
    Create,
    Update,
    Delete,
}

impl CouponAuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponAuditAction::Create => "COUPON_CREATE",
            CouponAuditAction::Update => "COUPON_UPDATE",
            CouponAuditAction::Delete => "COUPON_DELETE",
        }
    }
}

/// Append an audit row. A failed write is logged and otherwise ignored; the
/// mutation it describes has already happened.
pub async fn log_coupon_action(
    db: &SqlitePool,
    actor_id: &str,
    action: CouponAuditAction,
    description: &str,
    metadata: Option<&serde_json::Value>,
) {
    let metadata = metadata.map(|m| m.to_string());

    let result = sqlx::query(
        "INSERT INTO activity_logs (actor_id, action, description, metadata) VALUES (?, ?, ?, ?)",
    )
    .bind(actor_id)
    .bind(action.as_str())
    .bind(description)
    .bind(metadata.as_deref())
    .execute(db)
    .await;

    if let Err(e) = result {
        crate::log_error!("AUDIT", "Failed to write audit entry", e);
    }
}
