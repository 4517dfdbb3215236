//! MIME type lookup by file extension

use std::path::Path;

/// Content type used for every video response
pub const VIDEO_MP4: &str = "video/mp4";

/// Fallback for unknown extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the `Content-Type` of a file from its extension (case-insensitive)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use video_range_server::http::mime::content_type_for;
/// assert_eq!(content_type_for(Path::new("clip.mp4")), "video/mp4");
/// assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("js" | "mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",

        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        Some("mp4" | "m4v") => VIDEO_MP4,
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        // Subtitle tracks usually sit next to the videos
        Some("vtt") => "text/vtt",
        Some("srt") => "application/x-subrip",
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("ts") => "video/mp2t",

        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg" | "oga") => "audio/ogg",
        Some("wav") => "audio/wav",

        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",

        _ => OCTET_STREAM,
    }
}
