use sqlx::SqlitePool;

/// Create every table and index the crate uses. Safe to run on each start.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ═══════════════════════════════════════
    // TABLE: coupons
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS coupons (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            code                TEXT    NOT NULL UNIQUE CHECK(length(code) > 0),
            discount_type       TEXT    NOT NULL CHECK(discount_type IN ('percentage', 'fixed')),
            discount_value      REAL    NOT NULL CHECK(discount_value > 0),
            min_order_amount    REAL    CHECK(min_order_amount IS NULL OR min_order_amount >= 0),
            max_discount_amount REAL    CHECK(max_discount_amount IS NULL OR max_discount_amount >= 0),
            valid_until         TEXT,
            is_active           INTEGER NOT NULL DEFAULT 1,
            created_at          TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at          TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK(discount_type <> 'percentage' OR discount_value <= 100)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_coupons_created_at ON coupons(created_at)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: activity_logs
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS activity_logs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            actor_id    TEXT,
            action      TEXT    NOT NULL,
            description TEXT    NOT NULL,
            metadata    TEXT,
            created_at  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_activity_logs_action ON activity_logs(action)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::connect_in_memory;

    #[tokio::test]
    async fn migrations_can_run_twice() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn schema_refuses_out_of_range_percentages() {
        let pool = connect_in_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO coupons (code, discount_type, discount_value) VALUES ('BIG', 'percentage', 150)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());

        sqlx::query("INSERT INTO coupons (code, discount_type, discount_value) VALUES ('BIG', 'fixed', 150)")
            .execute(&pool)
            .await
            .unwrap();
    }
}
