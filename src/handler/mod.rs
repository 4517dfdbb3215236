//! Request handler module
//!
//! Routes each request either to the video responder (range-aware `.mp4`
//! serving) or to the static file fallback.

pub mod path;
pub mod router;
pub mod static_files;
pub mod video;

// Re-export main entry point
pub use router::handle_request;
pub use video::FileTarget;
