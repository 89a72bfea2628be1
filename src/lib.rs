pub mod audit;
pub mod auth;
pub mod cache;
pub mod commands;
pub mod config;
pub mod database;
pub mod eligibility;
pub mod errors;
pub mod logger;
pub mod models;
pub mod rate_limiter;
pub mod validation;

use auth::session::SessionStore;
use cache::QueryCache;
use config::AppConfig;
use errors::AppError;
use models::coupon::Coupon;
use std::path::Path;
use std::sync::Mutex;

/// Shared state handed to every command.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub sessions: Mutex<SessionStore>,
    pub coupon_cache: QueryCache<Vec<Coupon>>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        Self {
            db,
            sessions: Mutex::new(SessionStore::new(config.security.session_timeout_mins)),
            coupon_cache: QueryCache::new(),
            config,
        }
    }
}

/// Load configuration, start logging and open the store under `data_dir`.
pub async fn init(data_dir: &Path) -> Result<AppState, AppError> {
    if AppConfig::load_from_file(&data_dir.join(".env")).is_some() {
        eprintln!("Loaded environment from {}", data_dir.join(".env").display());
    }
    let config = config::init_config().clone();
    config.validate().map_err(AppError::Internal)?;

    if let Err(e) = logger::init_global_logger(&config.get_log_dir(data_dir), &config.logging) {
        eprintln!("Warning: failed to initialize logger: {}", e);
    }

    log_info!("APP", "Coupon service starting", serde_json::json!({
        "version": config.version,
        "environment": config.environment.as_str(),
        "data_dir": data_dir.to_string_lossy(),
    }));

    let pool = database::connection::init_db(&config.get_database_path(data_dir), &config.database).await?;
    Ok(AppState::new(pool, config))
}
