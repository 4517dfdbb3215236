// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub serve: ServeConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads, CPU cores when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Document root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServeConfig {
    /// Directory that URL paths are resolved against
    pub root: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level: debug, info, warn or error
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Connection behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds to wait for a request head, 0 disables it
    pub header_read_timeout: u64,
    /// Seconds to wait for open connections after a shutdown signal
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// `Server` header value, empty to omit it
    pub server_name: String,
}
