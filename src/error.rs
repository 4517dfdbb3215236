//! Startup error type
//!
//! Request-level failures never reach this type; the router turns them into
//! responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    #[error("document root {path:?} is not a directory")]
    InvalidRoot { path: String },

    #[error("failed to initialize logger: {0}")]
    Logger(std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
