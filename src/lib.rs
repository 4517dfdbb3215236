//! HTTP file server with byte-range support for video seeking.
//!
//! `.mp4` files are answered by the range-aware video responder; every other
//! path falls back to plain static serving. All responses carry
//! `Accept-Ranges: bytes` and `Access-Control-Allow-Origin: *`.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::{Result, ServerError};
