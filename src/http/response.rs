//! HTTP response building module
//!
//! Builders for every status the server emits, plus the finalization step
//! that stamps the always-on headers onto each response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_LENGTH,
    CONTENT_RANGE, CONTENT_TYPE, LOCATION, SERVER,
};
use hyper::{Response, StatusCode};

use super::mime;
use super::range::RequestedRange;

/// Response type produced by every handler
pub type HttpResponse = Response<Full<Bytes>>;

/// Headers added to every response after routing
#[derive(Debug, Clone)]
pub struct DefaultHeaders {
    server: Option<HeaderValue>,
}

impl DefaultHeaders {
    /// An unusable `server_name` (control characters) drops the `Server` header
    pub fn new(server_name: &str) -> Self {
        let server = if server_name.is_empty() {
            None
        } else {
            HeaderValue::from_str(server_name).ok()
        };
        Self { server }
    }

    /// Insert `Accept-Ranges`, `Access-Control-Allow-Origin` and `Server`
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if let Some(server) = &self.server {
            headers.insert(SERVER, server.clone());
        }
    }
}

/// Build 200 response carrying a whole video file
pub fn build_video_response(data: Bytes, file_size: u64) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime::VIDEO_MP4)
        .header(CONTENT_LENGTH, file_size)
        .body(Full::new(data))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response for a video range
pub fn build_partial_video_response(
    data: Bytes,
    range: RequestedRange,
    file_size: u64,
) -> HttpResponse {
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, mime::VIDEO_MP4)
        .header(CONTENT_RANGE, range.content_range(file_size))
        .header(CONTENT_LENGTH, range.len())
        .body(Full::new(data))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response for a static file
///
/// `content_length` is passed separately so HEAD responses can carry an empty body.
pub fn build_file_response(data: Bytes, content_type: &str, content_length: u64) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(data))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> HttpResponse {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect, used to add the trailing slash to directory URLs
pub fn build_moved_permanently_response(location: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_LENGTH, 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response(reason: &str) -> HttpResponse {
    build_text_response(StatusCode::BAD_REQUEST, format!("400 Bad Request: {reason}"))
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found".to_string())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> HttpResponse {
    let body = "405 Method Not Allowed";
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_LENGTH, body.len())
        .header(ALLOW, "GET, HEAD")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> HttpResponse {
    let body = "416 Range Not Satisfiable";
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_LENGTH, body.len())
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> HttpResponse {
    build_text_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "500 Internal Server Error".to_string(),
    )
}

fn build_text_response(status: StatusCode, body: String) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Remove the body of a response, keeping status and headers
pub fn strip_body(response: HttpResponse) -> HttpResponse {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
