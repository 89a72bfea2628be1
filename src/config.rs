//! Environment-based configuration.
//!
//! Values come from, in order of priority:
//! 1. Environment variables
//! 2. A `.env` file loaded with [`AppConfig::load_from_file`]
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Read `APP_ENV`; anything other than `production` is development.
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app_name: String,
    pub version: String,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub storefront: StorefrontConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, relative to the data directory
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Lifetime of a session handed over by the identity provider
    pub session_timeout_mins: u64,

    /// Coupon lookups a customer may make per window at checkout
    pub checkout_attempts: u32,
    pub checkout_window_secs: i64,

    /// Write coupon mutations to `activity_logs`
    pub enable_audit_log: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// error, warn, info, debug or trace
    pub level: String,
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub json_format: bool,
    pub max_file_size_mb: u64,
    pub max_log_files: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Prefix for amounts in coupon labels
    pub currency_symbol: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key).map(|s| s == "true").unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::from_env();

        Self {
            environment: env,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Bakery Storefront".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            database: DatabaseConfig {
                path: env::var("DB_PATH").unwrap_or_else(|_| "bakery.db".to_string()),
                max_connections: env_or("DB_MAX_CONNECTIONS", 10),
                min_connections: env_or("DB_MIN_CONNECTIONS", 1),
                connect_timeout_secs: 30,
                idle_timeout_secs: 600,
            },

            security: SecurityConfig {
                session_timeout_mins: env_or("SESSION_TIMEOUT_MINS", 480),
                checkout_attempts: env_or("CHECKOUT_COUPON_ATTEMPTS", 10),
                checkout_window_secs: env_or("CHECKOUT_COUPON_WINDOW_SECS", 60),
                enable_audit_log: env_flag("AUDIT_LOG", true),
            },

            logging: LoggingConfig {
                level: env::var("RUST_LOG").unwrap_or_else(|_| {
                    if env.is_production() { "warn".to_string() } else { "debug".to_string() }
                }),
                log_to_file: env_flag("LOG_TO_FILE", true),
                log_to_stdout: env_flag("LOG_TO_STDOUT", true),
                json_format: env.is_production(),
                max_file_size_mb: 10,
                max_log_files: 5,
            },

            storefront: StorefrontConfig {
                currency_symbol: env::var("CURRENCY_SYMBOL").unwrap_or_else(|_| "₹".to_string()),
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::default()
    }

    /// Export `KEY=value` lines from a `.env` file, then load. Returns `None`
    /// when the file does not exist or cannot be read.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                env::set_var(key.trim(), value);
            }
        }

        Some(Self::load())
    }

    pub fn get_log_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join("logs")
    }

    pub fn get_database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database.path)
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }
        if self.database.min_connections > self.database.max_connections {
            return Err("DB_MIN_CONNECTIONS cannot exceed DB_MAX_CONNECTIONS".to_string());
        }
        if self.security.session_timeout_mins == 0 {
            return Err("SESSION_TIMEOUT_MINS must be at least 1".to_string());
        }
        if self.security.checkout_attempts == 0 || self.security.checkout_window_secs <= 0 {
            return Err("Checkout coupon rate limit must allow at least one attempt per window".to_string());
        }
        Ok(())
    }
}

static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

pub fn init_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::load)
}

/// Global configuration, loaded from the environment on first use.
pub fn get_config() -> &'static AppConfig {
    init_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::load()
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn inverted_pool_bounds_are_rejected() {
        let mut cfg = config();
        cfg.database.min_connections = cfg.database.max_connections + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn disabled_rate_limit_is_rejected() {
        let mut cfg = config();
        cfg.security.checkout_attempts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_env_file_yields_none() {
        assert!(AppConfig::load_from_file(Path::new("/definitely/not/here/.env")).is_none());
    }

    #[test]
    fn paths_are_relative_to_the_data_dir() {
        let cfg = config();
        let dir = Path::new("/srv/bakery");
        assert_eq!(cfg.get_log_dir(dir), dir.join("logs"));
        assert_eq!(cfg.get_database_path(dir), dir.join(&cfg.database.path));
    }
}
