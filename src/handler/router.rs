//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! translation, and dispatch to the video responder or the static fallback.

use hyper::body::Body as _;
use hyper::header::{HeaderName, HeaderValue, RANGE, REFERER, USER_AGENT};
use hyper::{Method, Request};
use std::sync::Arc;
use std::time::Instant;

use super::path;
use super::static_files;
use super::video::{self, FileTarget};
use crate::config::AppState;
use crate::http::{self, response, HttpResponse, RangeError};
use crate::logger::{self, AccessLogEntry};
use crate::server::PeerAddr;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    /// Raw `Range` value; undecodable bytes are rejected when it is resolved
    pub range_header: Option<&'a HeaderValue>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request(req: &'a Request<()>) -> Self {
        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: *req.method() == Method::HEAD,
            range_header: req.headers().get(RANGE),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(req: Request<()>, state: Arc<AppState>) -> HttpResponse {
    let started = Instant::now();

    let mut response = dispatch(&req, &state).await;
    if *req.method() == Method::HEAD {
        response = response::strip_body(response);
    }

    if state.config.logging.access_log {
        log_access(&req, &response, started, &state.config.logging.access_log_format);
    }
    response
}

async fn dispatch(req: &Request<()>, state: &AppState) -> HttpResponse {
    if let Some(resp) = check_http_method(req.method()) {
        return resp;
    }

    let ctx = RequestContext::from_request(req);
    let target = path::translate_path(&state.root, ctx.path);

    if !target.trailing_slash {
        if let Some(video) = FileTarget::probe(&target.fs_path).await {
            return serve_video(&ctx, &video).await;
        }
    }

    static_files::serve(&ctx, &target).await
}

/// Only GET and HEAD are served
fn check_http_method(method: &Method) -> Option<HttpResponse> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_debug(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Resolve the range header and frame the video response
async fn serve_video(ctx: &RequestContext<'_>, video: &FileTarget) -> HttpResponse {
    let header = ctx.range_header.map(|value| {
        value.to_str().map_err(|_| {
            RangeError::Malformed(String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
    });
    let resolved = header
        .transpose()
        .and_then(|header| http::resolve_range(header, video.size));

    let range = match resolved {
        Ok(range) => range,
        Err(RangeError::Malformed(value)) => {
            logger::log_warning(&format!(
                "Malformed Range header {value:?} for {}",
                ctx.path
            ));
            return http::build_400_response("malformed Range header");
        }
        Err(RangeError::NotSatisfiable { file_size }) => {
            return http::build_416_response(file_size);
        }
    };

    match video::build_response(video, range, ctx.is_head).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read video '{}': {e}",
                video.path.display()
            ));
            http::build_500_response()
        }
    }
}

fn log_access(req: &Request<()>, response: &HttpResponse, started: Instant, format: &str) {
    let remote_addr = req
        .extensions()
        .get::<PeerAddr>()
        .map_or_else(|| "-".to_string(), |p| p.0.ip().to_string());
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr,
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = logger::version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, format);
}
