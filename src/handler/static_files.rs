//! Static file serving module
//!
//! Fallback for everything that is not a video: plain files, index files and
//! directory listings.

use hyper::body::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;

use super::path::TranslatedPath;
use super::router::RequestContext;
use crate::http::{self, mime, response};
use crate::http::response::HttpResponse;
use crate::logger;

/// Index files tried in order when a directory is requested
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Characters escaped in listing links
const LINK_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Serve a translated path from the document root
pub async fn serve(ctx: &RequestContext<'_>, target: &TranslatedPath) -> HttpResponse {
    let Ok(metadata) = fs::metadata(&target.fs_path).await else {
        return http::build_404_response();
    };

    if metadata.is_dir() {
        return serve_directory(ctx, target).await;
    }

    // A slash after a file name is not a file
    if target.trailing_slash {
        return http::build_404_response();
    }

    serve_file(&target.fs_path, ctx.is_head).await
}

async fn serve_directory(ctx: &RequestContext<'_>, target: &TranslatedPath) -> HttpResponse {
    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return response::build_moved_permanently_response(&location);
    }

    for index in INDEX_FILES {
        let index_path = target.fs_path.join(index);
        if fs::metadata(&index_path).await.is_ok_and(|m| m.is_file()) {
            return serve_file(&index_path, ctx.is_head).await;
        }
    }

    match list_directory(&target.fs_path, ctx.path).await {
        Ok(html) => response::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot list directory '{}': {e}",
                target.fs_path.display()
            ));
            http::build_404_response()
        }
    }
}

/// Serve a single file with a content type guessed from its extension
pub async fn serve_file(path: &Path, is_head: bool) -> HttpResponse {
    let content_type = mime::content_type_for(path);

    if is_head {
        return match fs::metadata(path).await {
            Ok(m) => response::build_file_response(Bytes::new(), content_type, m.len()),
            Err(_) => http::build_404_response(),
        };
    }

    match fs::read(path).await {
        Ok(content) => {
            let len = content.len() as u64;
            response::build_file_response(Bytes::from(content), content_type, len)
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read file '{}': {e}", path.display()));
            http::build_404_response()
        }
    }
}

/// Render an HTML listing of `dir`, whose URL is `url_path`
pub async fn list_directory(dir: &Path, url_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort_by_key(|name| name.to_lowercase());

    let display_path = percent_encoding::percent_decode_str(url_path).decode_utf8_lossy();
    let title = format!("Directory listing for {}", escape_html(&display_path));

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &entries {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            utf8_percent_encode(name, LINK_ESCAPE),
            escape_html(name)
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

/// Escape text for an HTML element or attribute
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
