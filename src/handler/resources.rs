//! Resource serving module
//!
//! Serves the persisted JSON resources: GET returns the stored bytes (or the
//! route's default body before anything was stored), POST overwrites them.

use crate::config::{AppState, ResourceDef};
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Serve a GET for a resource route
///
/// The stored bytes are returned verbatim. A resource that has never been
/// written returns the route's configured default body.
pub async fn serve_get(state: &AppState, resource: &ResourceDef) -> Response<Full<Bytes>> {
    let enable_cors = state.config.http.enable_cors;
    let server_name = &state.config.http.server_name;

    match state.store.read(&resource.key).await {
        Ok(Some(data)) => http::build_resource_response(data, enable_cors, server_name),
        Ok(None) => http::build_resource_response(
            Bytes::from(resource.default.clone()),
            enable_cors,
            server_name,
        ),
        Err(err) => {
            logger::log_error(&format!("Failed to read resource: {err}"));
            http::build_500_response(enable_cors)
        }
    }
}

/// Serve a POST for a resource route
///
/// The request body replaces the stored bytes wholesale. No parsing or
/// validation is applied to the payload.
pub async fn serve_post(
    state: &AppState,
    resource: &ResourceDef,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let enable_cors = state.config.http.enable_cors;
    let server_name = &state.config.http.server_name;

    match state.store.write(&resource.key, &body).await {
        Ok(()) => http::build_post_ok_response(enable_cors, server_name),
        Err(err) => {
            logger::log_error(&format!("Failed to write resource: {err}"));
            http::build_500_response(enable_cors)
        }
    }
}
