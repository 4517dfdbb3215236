// Configuration module entry point
// Loads configuration from file and environment, and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServeConfig, ServerConfig};

/// Default config file, looked up without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

const DEFAULT_SERVER_NAME: &str = concat!("video-range-server/", env!("CARGO_PKG_VERSION"));

impl Config {
    /// Load configuration from specified file path (extension optional)
    ///
    /// The file is optional. Environment variables prefixed with `SERVER`
    /// override it, e.g. `SERVER_SERVER__PORT=9000` or `SERVER_SERVE__ROOT=/srv`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8083)?
            .set_default("serve.root", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.server_name", DEFAULT_SERVER_NAME)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{addr}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_missing() -> Config {
        Config::load_from("does-not-exist/config").unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = load_missing();
        assert_eq!(cfg.server.port, 8083);
        assert_eq!(cfg.serve.root, ".");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.performance.header_read_timeout, 30);
        assert!(cfg.server.workers.is_none());
    }

    #[test]
    fn test_binds_all_interfaces() {
        let cfg = load_missing();
        let addr = cfg.get_socket_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 8083);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9001\n\n[serve]\nroot = \"/srv/videos\"\n\n[logging]\naccess_log = false\n",
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9001);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.serve.root, "/srv/videos");
        assert!(!cfg.logging.access_log);
    }

    #[test]
    fn test_invalid_host() {
        let mut cfg = load_missing();
        cfg.server.host = "not a host".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(ServerError::InvalidAddress(_))
        ));
    }
}
