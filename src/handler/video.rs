//! Video responder
//!
//! Serves `.mp4` files with byte-range support so players can seek.

use hyper::body::Bytes;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::http::range::RequestedRange;
use crate::http::response::{self, HttpResponse};

/// Extension that routes a file to the video responder
pub const VIDEO_EXTENSION: &str = ".mp4";

/// A video file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub path: PathBuf,
    pub size: u64,
}

impl FileTarget {
    /// Returns the target if `path` is an existing regular file ending in `.mp4`
    pub async fn probe(path: &Path) -> Option<Self> {
        if !path.to_string_lossy().ends_with(VIDEO_EXTENSION) {
            return None;
        }
        let metadata = fs::metadata(path).await.ok()?;
        metadata.is_file().then(|| Self {
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

/// Build the response for a video file
///
/// With a range the reply is 206 and carries exactly `range.len()` bytes read
/// from `range.start`; without one it is 200 with the whole file. The body is
/// read fully into memory first. HEAD skips the read.
pub async fn build_response(
    target: &FileTarget,
    range: Option<RequestedRange>,
    is_head: bool,
) -> io::Result<HttpResponse> {
    match range {
        Some(range) => {
            let body = if is_head {
                Bytes::new()
            } else {
                read_window(&target.path, range.start, range.len()).await?
            };
            Ok(response::build_partial_video_response(
                body,
                range,
                target.size,
            ))
        }
        None => {
            let body = if is_head {
                Bytes::new()
            } else {
                read_window(&target.path, 0, target.size).await?
            };
            Ok(response::build_video_response(body, target.size))
        }
    }
}

/// Read exactly `len` bytes starting at `start`
///
/// Fails with `UnexpectedEof` if the file is shorter than expected, e.g. it was
/// truncated after its size was taken.
async fn read_window(path: &Path, start: u64, len: u64) -> io::Result<Bytes> {
    let capacity = usize::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "range too large"))?;

    let mut file = File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    let mut buf = vec![0u8; capacity];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
    use hyper::StatusCode;

    fn sample_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn write_video(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).await.unwrap();
        path
    }

    async fn body_of(response: HttpResponse) -> Vec<u8> {
        use http_body_util::BodyExt;
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_probe_requires_mp4_file() {
        let dir = tempfile::tempdir().unwrap();
        let video = write_video(dir.path(), "clip.mp4", b"abc").await;
        let text = write_video(dir.path(), "notes.txt", b"abc").await;
        fs::create_dir(dir.path().join("folder.mp4")).await.unwrap();

        let target = FileTarget::probe(&video).await.unwrap();
        assert_eq!(target.size, 3);
        assert!(FileTarget::probe(&text).await.is_none());
        assert!(FileTarget::probe(&dir.path().join("folder.mp4")).await.is_none());
        assert!(FileTarget::probe(&dir.path().join("missing.mp4")).await.is_none());
    }

    #[tokio::test]
    async fn test_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = sample_bytes(1000);
        let path = write_video(dir.path(), "clip.mp4", &data).await;
        let target = FileTarget::probe(&path).await.unwrap();

        let response = build_response(&target, None, false).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "video/mp4");
        assert_eq!(response.headers()[CONTENT_LENGTH], "1000");
        assert!(response.headers().get(CONTENT_RANGE).is_none());
        assert_eq!(body_of(response).await, data);
    }

    #[tokio::test]
    async fn test_partial_window() {
        let dir = tempfile::tempdir().unwrap();
        let data = sample_bytes(1000);
        let path = write_video(dir.path(), "clip.mp4", &data).await;
        let target = FileTarget::probe(&path).await.unwrap();

        let range = RequestedRange { start: 250, end: 499 };
        let response = build_response(&target, Some(range), false).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 250-499/1000");
        assert_eq!(response.headers()[CONTENT_LENGTH], "250");
        assert_eq!(body_of(response).await, &data[250..500]);
    }

    #[tokio::test]
    async fn test_head_skips_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video(dir.path(), "clip.mp4", &sample_bytes(64)).await;
        let target = FileTarget::probe(&path).await.unwrap();

        let response = build_response(&target, None, true).await.unwrap();
        assert_eq!(response.headers()[CONTENT_LENGTH], "64");
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_truncated_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_video(dir.path(), "clip.mp4", &sample_bytes(100)).await;
        let target = FileTarget::probe(&path).await.unwrap();
        fs::write(&path, b"short").await.unwrap();

        let range = RequestedRange { start: 0, end: 99 };
        let err = build_response(&target, Some(range), false).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
