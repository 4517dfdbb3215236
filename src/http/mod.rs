//! HTTP protocol layer module
//!
//! Range resolution, MIME lookup and response builders, decoupled from routing.

pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{resolve_range, RangeError, RequestedRange};
pub use response::{
    build_400_response, build_404_response, build_405_response, build_416_response,
    build_500_response, DefaultHeaders, HttpResponse,
};
