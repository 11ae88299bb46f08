//! Request handler module
//!
//! Responsible for request routing dispatch and business logic processing:
//! routing GET/POST to the configured resources and answering CORS preflights.

pub mod resources;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
