#![allow(dead_code)]

use http_body_util::BodyExt;
use hyper::Request;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use video_range_server::config::{AppState, Config};
use video_range_server::http::HttpResponse;

/// Deterministic, non-repeating-looking video payload
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

/// Config with defaults, the given document root, and quiet access logs
pub fn test_config(root: &Path) -> Config {
    let mut cfg = Config::load_from("tests/does-not-exist").expect("default config");
    cfg.serve.root = root.to_string_lossy().into_owned();
    cfg.logging.access_log = false;
    cfg.http.server_name = "test-server".to_string();
    cfg
}

/// Document root with `clip.mp4` (1000 bytes), `notes.txt` and a `season/` directory
pub fn media_root() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("clip.mp4"), sample_bytes(1000)).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello notes").unwrap();
    std::fs::create_dir(dir.path().join("season")).unwrap();
    std::fs::write(dir.path().join("season").join("ep1.mp4"), sample_bytes(10)).unwrap();
    dir
}

pub fn state_for(root: &Path) -> Arc<AppState> {
    Arc::new(AppState::new(&test_config(root)))
}

pub fn get(path: &str) -> Request<()> {
    Request::get(path).body(()).unwrap()
}

pub fn get_range(path: &str, range: &str) -> Request<()> {
    Request::get(path).header("Range", range).body(()).unwrap()
}

pub async fn body_bytes(response: HttpResponse) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}
