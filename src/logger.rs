use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::RouterConfig;

static LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);
static INSTALLED: AtomicBool = AtomicBool::new(false);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

/// Installs the logger, or swaps the configuration of an already installed one.
pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = config.min_level;
    LOGGER.update_config(config)?;

    if !INSTALLED.swap(true, Ordering::SeqCst) {
        if let Err(e) = log::set_logger(&*LOGGER) {
            INSTALLED.store(false, Ordering::SeqCst);
            return Err(format!("Failed to set logger: {:?}", e));
        }
    }

    log::set_max_level(max_level);
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    pub module: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().to_string(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            module: record.module_path().map(str::to_string),
            line: record.line(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub show_colors: bool,
    pub show_location: bool,
    pub timestamp_format: String,
    /// One JSON object per line instead of the human readable format.
    pub output_json: bool,
    pub log_to_file: bool,
    pub log_file_path: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: true,
            show_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_to_file: false,
            log_file_path: "solegen.log".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_to_file = true;
        self.log_file_path = path.to_string();
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: false,
            output_json: true,
            log_to_file: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            show_colors: true,
            show_location: true,
            ..Default::default()
        }
    }
}

pub struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) -> Result<(), String> {
        let file = if new_config.log_to_file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&new_config.log_file_path)
                .map_err(|e| format!("Failed to open {}: {}", new_config.log_file_path, e))?;
            Some(file)
        } else {
            None
        };

        *lock(&self.log_file) = file;
        *lock(&self.config) = new_config;
        Ok(())
    }

    fn format_line(entry: &LogEntry, level: Level, config: &LoggerConfig) -> String {
        if config.output_json {
            return serde_json::to_string(entry).unwrap_or_else(|_| entry.message.clone());
        }

        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level_str = format!("{:<5}", entry.level);
        let location = match (config.show_location, &entry.module, entry.line) {
            (true, Some(module), Some(line)) => format!(" ({}:{})", module, line),
            _ => String::new(),
        };

        if config.show_colors {
            format!(
                "{} [{}] {}: {}{}",
                timestamp.bright_black(),
                level_str.color(level_color(level)).bold(),
                entry.target.bright_blue(),
                entry.message,
                location.bright_black()
            )
        } else {
            format!(
                "{} [{}] {}: {}{}",
                timestamp, level_str, entry.target, entry.message, location
            )
        }
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= lock(&self.config).min_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_record(record);
        let config = lock(&self.config).clone();
        let line = Self::format_line(&entry, record.level(), &config);

        let _ = writeln!(io::stderr(), "{}", line);

        if config.log_to_file {
            if let Some(file) = lock(&self.log_file).as_mut() {
                // Files always get uncolored output.
                let plain = if config.output_json || !config.show_colors {
                    line
                } else {
                    Self::format_line(&entry, record.level(), &config.clone().with_colors(false))
                };
                let _ = writeln!(file, "{}", plain);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = lock(&self.log_file).as_mut() {
            let _ = file.flush();
        }
    }
}

/// Logs the routing flags the process started with.
pub fn log_router_config(config: &RouterConfig) {
    let flag = |enabled: bool| if enabled { "on" } else { "off" };
    log::info!("Router configuration:");
    log::info!("   Premium kill-switch: {}", flag(config.premium_kill_switch));
    log::info!("   Premium rollout: {}", flag(config.premium_rollout));
    log::info!("   Fallback: {}", flag(config.fallback_enabled));
    log::info!("   Re-validate on fallback: {}", flag(config.revalidate_on_fallback));
    log::info!("   Attempt timeout: {}ms", config.attempt_timeout.as_millis());
}
