//! Structured logging.
//!
//! Lines go to stdout and to a daily file under `<data_dir>/logs`, as JSON in
//! production and as readable text in development. Files roll over to
//! numbered siblings (`coupons-2026-10-16.1.log`, ...) once they pass the
//! configured size.
//!
//! The `log_*!` macros do nothing until [`init_global_logger`] has run, so
//! library code can log unconditionally.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::config::LoggingConfig;

const REDACTED: &str = "***REDACTED***";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Unknown names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "ERROR" => LogLevel::Error,
            "WARN" | "WARNING" => LogLevel::Warn,
            "DEBUG" => LogLevel::Debug,
            "TRACE" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub target: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl LogEntry<'_> {
    fn render(&self, json: bool) -> String {
        if json {
            return serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        }

        let mut line = format!(
            "{} [{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level.as_str(),
            self.target,
            self.message
        );
        if let Some(error) = self.error {
            line.push_str(&format!(" | error: {}", error));
        }
        if let Some(data) = &self.data {
            line.push_str(&format!(" | {}", data));
        }
        line
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub json_format: bool,
    pub max_file_size_bytes: u64,
    pub max_log_files: u32,
}

impl From<&LoggingConfig> for LoggerConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            level: LogLevel::parse(&cfg.level),
            log_to_file: cfg.log_to_file,
            log_to_stdout: cfg.log_to_stdout,
            json_format: cfg.json_format,
            max_file_size_bytes: cfg.max_file_size_mb * 1024 * 1024,
            max_log_files: cfg.max_log_files.max(1),
        }
    }
}

struct FileSink {
    writer: BufWriter<File>,
    written: u64,
}

pub struct Logger {
    config: LoggerConfig,
    log_dir: PathBuf,
    sink: Mutex<Option<FileSink>>,
}

impl Logger {
    pub fn init(log_dir: &Path, config: LoggerConfig) -> Result<Self, String> {
        let logger = Self {
            config,
            log_dir: log_dir.to_path_buf(),
            sink: Mutex::new(None),
        };

        if logger.config.log_to_file {
            std::fs::create_dir_all(log_dir)
                .map_err(|e| format!("Failed to create log directory: {}", e))?;
            let sink = logger.open_sink()?;
            *logger.sink.lock().map_err(|e| e.to_string())? = Some(sink);
        }

        Ok(logger)
    }

    fn file_path(&self, generation: u32) -> PathBuf {
        let date = Local::now().format("%Y-%m-%d");
        if generation == 0 {
            self.log_dir.join(format!("coupons-{}.log", date))
        } else {
            self.log_dir.join(format!("coupons-{}.{}.log", date, generation))
        }
    }

    /// Open today's file, rolling it first if it is already full.
    fn open_sink(&self) -> Result<FileSink, String> {
        let path = self.file_path(0);
        let existing = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if existing >= self.config.max_file_size_bytes {
            self.roll_files();
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(FileSink {
            writer: BufWriter::new(file),
            written,
        })
    }

    /// Shift `.N.log` to `.N+1.log`, dropping the oldest, and move the live
    /// file to `.1.log`.
    fn roll_files(&self) {
        let keep = self.config.max_log_files;
        let _ = std::fs::remove_file(self.file_path(keep));
        for generation in (1..keep).rev() {
            let from = self.file_path(generation);
            if from.exists() {
                let _ = std::fs::rename(&from, self.file_path(generation + 1));
            }
        }
        let _ = std::fs::rename(self.file_path(0), self.file_path(1));
    }

    fn write(&self, entry: &LogEntry<'_>) {
        if entry.level > self.config.level {
            return;
        }

        let line = entry.render(self.config.json_format);

        if self.config.log_to_stdout {
            if entry.level <= LogLevel::Warn {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }

        if !self.config.log_to_file {
            return;
        }
        let Ok(mut guard) = self.sink.lock() else {
            return;
        };

        if let Some(sink) = guard.as_mut() {
            if writeln!(sink.writer, "{}", line).and_then(|_| sink.writer.flush()).is_ok() {
                sink.written += line.len() as u64 + 1;
            }
            if sink.written >= self.config.max_file_size_bytes {
                *guard = None;
                self.roll_files();
                *guard = self.open_sink().ok();
            }
        }
    }

    fn log(&self, level: LogLevel, target: &str, message: &str, data: Option<serde_json::Value>, error: Option<&str>) {
        self.write(&LogEntry {
            timestamp: Local::now(),
            level,
            target,
            message,
            data,
            error,
        });
    }

    pub fn error(&self, target: &str, message: &str, error: Option<&str>) {
        self.log(LogLevel::Error, target, message, None, error);
    }

    pub fn warn(&self, target: &str, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Warn, target, message, data, None);
    }

    pub fn info(&self, target: &str, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Info, target, message, data, None);
    }

    pub fn debug(&self, target: &str, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Debug, target, message, data, None);
    }

    /// Coupon mutation record. Credentials in `data` are masked.
    pub fn coupon(&self, action: &str, data: &serde_json::Value) {
        self.log(LogLevel::Info, "COUPON", action, Some(redact(data)), None);
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    ["token", "secret", "password", "key"]
        .iter()
        .any(|needle| key.contains(needle))
}

/// Copy of `value` with every credential-looking field masked.
pub fn redact(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive(k) {
                        serde_json::Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact).collect())
        }
        other => other.clone(),
    }
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn init_global_logger(log_dir: &Path, config: &LoggingConfig) -> Result<(), String> {
    let logger = Logger::init(log_dir, LoggerConfig::from(config))?;
    GLOBAL_LOGGER
        .set(logger)
        .map_err(|_| "Logger already initialized".to_string())
}

pub fn get_logger() -> Option<&'static Logger> {
    GLOBAL_LOGGER.get()
}

#[macro_export]
macro_rules! log_error {
    ($target:expr, $msg:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.error($target, $msg, None);
        }
    };
    ($target:expr, $msg:expr, $err:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.error($target, $msg, Some($err.to_string().as_str()));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($target:expr, $msg:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.warn($target, $msg, None);
        }
    };
    ($target:expr, $msg:expr, $data:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.warn($target, $msg, Some($data));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($target:expr, $msg:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.info($target, $msg, None);
        }
    };
    ($target:expr, $msg:expr, $data:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.info($target, $msg, Some($data));
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($target:expr, $msg:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.debug($target, $msg, None);
        }
    };
    ($target:expr, $msg:expr, $data:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.debug($target, $msg, Some($data));
        }
    };
}

#[macro_export]
macro_rules! log_coupon {
    ($action:expr, $data:expr) => {
        if let Some(l) = $crate::logger::get_logger() {
            l.coupon($action, &$data);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bakery-log-{}-{}", name, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_config(max_bytes: u64) -> LoggerConfig {
        LoggerConfig {
            level: LogLevel::Debug,
            log_to_file: true,
            log_to_stdout: false,
            json_format: true,
            max_file_size_bytes: max_bytes,
            max_log_files: 3,
        }
    }

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(LogLevel::parse("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::parse(" Trace "), LogLevel::Trace);
        assert_eq!(LogLevel::parse("chatty"), LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Debug);
    }

    #[test]
    fn redaction_masks_nested_credentials() {
        let data = json!({
            "code": "CAKE10",
            "session_token": "abc",
            "actor": { "api_key": "zzz", "email": "ops@bakery.test" },
            "items": [{ "password": "hunter2" }]
        });
        let masked = redact(&data);
        assert_eq!(masked["code"], "CAKE10");
        assert_eq!(masked["session_token"], REDACTED);
        assert_eq!(masked["actor"]["api_key"], REDACTED);
        assert_eq!(masked["actor"]["email"], "ops@bakery.test");
        assert_eq!(masked["items"][0]["password"], REDACTED);
    }

    #[test]
    fn json_lines_are_written_to_the_daily_file() {
        let dir = temp_dir("write");
        let logger = Logger::init(&dir, file_config(1024 * 1024)).unwrap();
        logger.info("COUPON", "Coupon created", Some(json!({ "code": "CAKE10" })));
        logger.debug("COUPON", "Listing refreshed", None);

        let content = std::fs::read_to_string(logger.file_path(0)).unwrap();
        let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["level"], "INFO");
        assert_eq!(first["target"], "COUPON");
        assert_eq!(first["data"]["code"], "CAKE10");
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn entries_above_the_configured_level_are_dropped() {
        let dir = temp_dir("level");
        let mut cfg = file_config(1024 * 1024);
        cfg.level = LogLevel::Warn;
        let logger = Logger::init(&dir, cfg).unwrap();
        logger.info("COUPON", "quiet", None);
        logger.error("COUPON", "loud", Some("boom"));

        let content = std::fs::read_to_string(logger.file_path(0)).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("boom"));
    }

    #[test]
    fn full_file_rolls_over() {
        let dir = temp_dir("roll");
        let logger = Logger::init(&dir, file_config(64)).unwrap();
        for _ in 0..4 {
            logger.info("COUPON", "a line long enough to fill the tiny file quickly", None);
        }
        assert!(logger.file_path(1).exists());
        assert!(!logger.file_path(4).exists());
    }

    #[test]
    fn text_format_includes_error_and_data() {
        let entry = LogEntry {
            timestamp: Local::now(),
            level: LogLevel::Warn,
            target: "CHECKOUT",
            message: "rejected",
            data: Some(json!({ "kind": "Expired" })),
            error: Some("late"),
        };
        let line = entry.render(false);
        assert!(line.contains("[WARN] [CHECKOUT] rejected | error: late | {\"kind\":\"Expired\"}"));
    }
}
