//! HTTP Range header resolution module
//!
//! Single `bytes=<start>-<end>` ranges only. Either bound may be omitted: an
//! empty start means offset 0 and an empty end means the last byte of the file.
//! Note that `bytes=-N` is therefore the first N bytes, not an RFC 7233 suffix.

use thiserror::Error;

/// Resolved byte window, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedRange {
    /// First byte position
    pub start: u64,
    /// Last byte position (inclusive)
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl RequestedRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a file of `file_size` bytes
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

/// Range header resolution failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// Header present but unparsable - answered with 400
    #[error("malformed range header: {0:?}")]
    Malformed(String),
    /// Range lies outside the file - answered with 416
    #[error("range not satisfiable for file of {file_size} bytes")]
    NotSatisfiable { file_size: u64 },
}

/// Resolve a `Range` header value against a file size
///
/// Returns `Ok(None)` when no header was sent. An `end` past the last byte is
/// clamped to `file_size - 1`; a `start` past the last byte or past `end` is
/// not satisfiable.
///
/// # Examples
/// ```
/// use video_range_server::http::range::{resolve_range, RequestedRange};
///
/// let range = resolve_range(Some("bytes=0-99"), 1000).unwrap();
/// assert_eq!(range, Some(RequestedRange { start: 0, end: 99 }));
///
/// assert_eq!(resolve_range(None, 1000).unwrap(), None);
/// ```
pub fn resolve_range(
    range_header: Option<&str>,
    file_size: u64,
) -> Result<Option<RequestedRange>, RangeError> {
    let Some(header) = range_header else {
        return Ok(None);
    };

    let malformed = || RangeError::Malformed(header.to_string());

    let byte_range = header.strip_prefix("bytes=").ok_or_else(malformed)?;
    let (start_str, end_str) = byte_range.split_once('-').ok_or_else(malformed)?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    let start = if start_str.is_empty() {
        0
    } else {
        parse_bound(start_str).ok_or_else(malformed)?
    };

    let requested_end = if end_str.is_empty() {
        None
    } else {
        Some(parse_bound(end_str).ok_or_else(malformed)?)
    };

    let Some(last_byte) = file_size.checked_sub(1) else {
        return Err(RangeError::NotSatisfiable { file_size });
    };
    let end = requested_end.map_or(last_byte, |e| e.min(last_byte));

    if start > end {
        return Err(RangeError::NotSatisfiable { file_size });
    }

    Ok(Some(RequestedRange { start, end }))
}

/// Parse a decimal byte position; signs are not accepted
fn parse_bound(s: &str) -> Option<u64> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}
