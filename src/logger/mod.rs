//! Logger module
//!
//! Provides logging utilities for the server:
//! - Server lifecycle logging
//! - Access logging in several formats
//! - Leveled error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use hyper::Version;
use std::net::SocketAddr;
use std::str::FromStr;

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup. An unknown level falls back
/// to `info` with a warning.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse::<Level>().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, using info");
        Level::Info
    });
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )
}

fn enabled(level: Level) -> bool {
    writer::get().map_or(level >= Level::Info, |w| w.enabled(level))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    if !enabled(Level::Info) {
        return;
    }
    write_info("======================================");
    write_info("Video server started successfully");
    write_info(&format!("Listening on: http://{addr}/"));
    write_info(&format!("Document root: {}", config.serve.root));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_shutdown(reason: &str) {
    log_info(&format!("[Shutdown] {reason}, no longer accepting connections"));
}

pub fn log_info(message: &str) {
    if enabled(Level::Info) {
        write_info(message);
    }
}

pub fn log_debug(message: &str) {
    if enabled(Level::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_error(&format!("Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    if enabled(Level::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

/// Version number as it appears in a request line
pub fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "0.9"
    } else if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else if version == Version::HTTP_3 {
        "3"
    } else {
        "1.1"
    }
}
