use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::migrations::run_migrations;
use crate::config::DatabaseConfig;
use crate::errors::AppError;

/// Open the SQLite file at `db_path` and bring the schema up to date.
///
/// WAL journal, foreign keys on, and a busy timeout so concurrent writers
/// wait instead of failing.
pub async fn init_db(db_path: &Path, config: &DatabaseConfig) -> Result<SqlitePool, AppError> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::Internal(format!("Failed to create data directory: {}", e)))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    crate::log_info!("DATABASE", "Connection pool initialized", serde_json::json!({
        "min": config.min_connections,
        "max": config.max_connections,
        "db": db_path.display().to_string(),
    }));

    Ok(pool)
}

/// Migrated in-memory store. One connection, since every SQLite memory
/// connection is its own database.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_is_migrated_and_healthy() {
        let pool = connect_in_memory().await.unwrap();
        health_check(&pool).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM coupons")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn file_store_is_created_under_the_data_dir() {
        let dir = std::env::temp_dir().join(format!("bakery-db-{}", uuid::Uuid::new_v4()));
        let config = DatabaseConfig {
            path: "test.db".into(),
            max_connections: 2,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 60,
        };
        let pool = init_db(&dir.join(&config.path), &config).await.unwrap();
        health_check(&pool).await.unwrap();
        assert!(dir.join("test.db").exists());
        pool.close().await;
    }
}
