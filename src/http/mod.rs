//! HTTP protocol layer module
//!
//! Response builders for every status the server produces, decoupled from
//! routing and storage.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response,
    build_500_response, build_options_response, build_post_ok_response, build_resource_response,
};
