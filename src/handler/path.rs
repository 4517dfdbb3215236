//! URL path to filesystem path translation

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// A request path resolved below the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPath {
    pub fs_path: PathBuf,
    /// The URL path ended with `/`
    pub trailing_slash: bool,
}

/// Translate a URL path into a path below `root`
///
/// Query and fragment are dropped, the path is percent-decoded, and empty,
/// `.` and `..` segments are skipped so the result never leaves `root`
/// lexically. Symlinks inside `root` are followed as-is.
pub fn translate_path(root: &Path, url_path: &str) -> TranslatedPath {
    let path = url_path
        .split_once(['?', '#'])
        .map_or(url_path, |(p, _)| p);
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    // Checked before decoding, so `%2F` is a plain character here
    let trailing_slash = path.ends_with('/');

    let mut fs_path = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        // A decoded backslash must not act as a separator on Windows
        if segment.contains('\\') && cfg!(windows) {
            continue;
        }
        fs_path.push(segment);
    }

    TranslatedPath {
        fs_path,
        trailing_slash,
    }
}
