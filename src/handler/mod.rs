//! Request handler module
//!
//! Responsible for request dispatch: the fixed API endpoints and static file
//! serving from the document root.

mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
