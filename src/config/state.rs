// Application state module
// Read-only state shared by all request handlers

use std::path::PathBuf;

use super::types::Config;

/// Application state
///
/// Built once at startup and shared behind an `Arc`; nothing in it is mutated
/// while serving.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Document root, from `serve.root`
    pub root: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            root: PathBuf::from(&config.serve.root),
        }
    }
}
