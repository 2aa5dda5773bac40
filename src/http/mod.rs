//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, shared by the API
//! endpoints and the static file responder.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    apply_common_headers, build_301_response, build_304_response, build_404_response,
    build_501_response, build_error_response, build_file_response, build_html_response,
    strip_body,
};
